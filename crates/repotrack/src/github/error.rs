//! Errors surfaced by the fetch pipeline.

use thiserror::Error;

use crate::http::{HttpError, HttpResponse};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be built (bad URL, bad header value).
    #[error("Invalid request: {0}")]
    RequestConstruction(String),

    #[error("Transport error: {0}")]
    Transport(#[from] HttpError),

    /// Non-success status other than a rate-limit trip.
    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Malformed JSON or a record missing a required field.
    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not a GitHub repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Repository is not tracked: {0}")]
    RepositoryNotTracked(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl FetchError {
    /// Build an [`FetchError::Api`] from a non-success response, using the
    /// `message` field of a GitHub error body when there is one.
    pub fn from_response(response: &HttpResponse) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| response.text());

        Self::Api {
            status: response.status,
            message,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn api_error_prefers_github_message() {
        let err = FetchError::from_response(&response(
            404,
            r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#,
        ));
        match err {
            FetchError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = FetchError::from_response(&response(502, "Bad Gateway"));
        assert_eq!(err.to_string(), "GitHub API returned 502: Bad Gateway");
    }

    #[test]
    fn store_errors_convert() {
        let err: FetchError = StoreError::repository_not_found(3).into();
        assert!(matches!(err, FetchError::Store(_)));
        assert!(!err.is_cancelled());
        assert!(FetchError::Cancelled.is_cancelled());
    }
}
