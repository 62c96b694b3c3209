//! Error taxonomy for the search client.
//!
//! Everything is caught at the controller boundary: controllers translate
//! these into view messages or redirects and report a completion status to
//! the caller instead of propagating.

use thiserror::Error;

/// Failures at the HTTP layer, before any status-code interpretation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Search-flow failures as interpreted by the controllers.
#[derive(Debug, Error)]
pub enum SearchError {
    /// 401 from the API. Carries the return path for the login redirect.
    #[error("authentication required")]
    AuthRequired { next: String },

    /// 403 with a CSRF marker after the single refresh-and-retry cycle.
    #[error("CSRF validation failed. Please refresh the page and try again.")]
    CsrfInvalid,

    /// Any other non-OK status.
    #[error("search API returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_message_matches_user_facing_text() {
        let err = SearchError::CsrfInvalid;
        assert_eq!(
            err.to_string(),
            "CSRF validation failed. Please refresh the page and try again."
        );
    }

    #[test]
    fn api_error_includes_status_and_detail() {
        let err = SearchError::Api {
            status: 500,
            detail: "internal error".into(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("internal error"));
    }
}
