pub mod dispatcher;
pub mod log;

pub use dispatcher::{Dispatcher, DynDispatcher};
pub use log::LogDispatcher;

// Outbound W3C trace context injection needs reqwest.
#[cfg(feature = "trace-context")]
pub mod trace_context;
#[cfg(feature = "trace-context")]
pub use trace_context::inject_trace_context;
