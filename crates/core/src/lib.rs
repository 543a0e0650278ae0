pub mod event;
pub mod outcome;
pub mod types;

pub use event::{MalformedEvent, extract_from_slice, extract_transaction_id};
pub use outcome::DispatchResult;
pub use types::TransactionId;
