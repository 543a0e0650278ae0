//! Outbound W3C Trace Context propagation for HTTP dispatchers.
//!
//! Injects `traceparent` and `tracestate` headers into the trigger request so
//! the ledger's logs can be correlated with the worker span that sent it.
//! Without a registered global propagator this adds zero headers.

use opentelemetry::propagation::Injector;
use opentelemetry::{Context, global};

struct HeaderInjector<'a>(&'a mut reqwest::header::HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let Ok(name) = reqwest::header::HeaderName::from_bytes(key.as_bytes())
            && let Ok(val) = reqwest::header::HeaderValue::from_str(&value)
        {
            self.0.insert(name, val);
        }
    }
}

/// Inject the current span's trace context into a [`reqwest::RequestBuilder`].
pub fn inject_trace_context(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    let mut headers = reqwest::header::HeaderMap::new();
    let cx = Context::current();
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&cx, &mut HeaderInjector(&mut headers));
    });

    if headers.is_empty() {
        builder
    } else {
        builder.headers(headers)
    }
}
