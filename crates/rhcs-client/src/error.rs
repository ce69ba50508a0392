//! Error types for rhcs-client

use thiserror::Error;

/// Errors returned by a clusters-management API client.
///
/// `Clone` so that fakes can replay an injected failure on every call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The addressed object does not exist
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// The server answered with a non-success status
    #[error("request failed with status {code}: {reason}")]
    Status { code: u16, reason: String },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the error means the object is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. } | ApiError::Status { code: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = ApiError::NotFound {
            resource: "clusters/abc".to_string(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Status {
            code: 404,
            reason: "gone".to_string(),
        };
        assert!(err.is_not_found());

        let err = ApiError::Status {
            code: 500,
            reason: "boom".to_string(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_status_display_includes_reason() {
        let err = ApiError::Status {
            code: 409,
            reason: "cluster already has a default ingress".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("409"));
        assert!(msg.contains("default ingress"));
    }
}
