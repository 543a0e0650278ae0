use refire_core::DispatchResult;
use thiserror::Error;

/// Errors specific to the Firefly dispatcher.
///
/// These are internal errors that get classified into a [`DispatchResult`]
/// at the dispatcher boundary.
#[derive(Debug, Error)]
pub enum FireflyError {
    /// An HTTP-level error raised by the client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL cannot produce a trigger URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("client error: {0}")]
    Client(String),
}

impl FireflyError {
    /// Whether the error happened on the wire rather than while preparing
    /// the request.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_redirect()
            }
            Self::InvalidUrl(_) | Self::Client(_) => false,
        }
    }
}

impl From<FireflyError> for DispatchResult {
    fn from(err: FireflyError) -> Self {
        if err.is_transport() {
            DispatchResult::transport(err.to_string())
        } else {
            DispatchResult::unexpected(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_unexpected() {
        let result: DispatchResult = FireflyError::InvalidUrl("nope".into()).into();
        assert_eq!(result.kind(), "unexpected_failure");
    }

    #[test]
    fn client_error_is_unexpected() {
        let err = FireflyError::Client("tls backend".into());
        assert!(!err.is_transport());
        let result: DispatchResult = err.into();
        assert!(matches!(result, DispatchResult::UnexpectedFailure { .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_transport() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .unwrap_err();
        let err = FireflyError::from(err);
        assert!(err.is_transport());
        let result: DispatchResult = err.into();
        assert_eq!(result.kind(), "transport_failure");
    }

    #[test]
    fn error_display() {
        let err = FireflyError::InvalidUrl("bad".into());
        assert_eq!(err.to_string(), "invalid URL: bad");
    }
}
