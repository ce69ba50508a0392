//! Error taxonomy for the reconciliation core.

use std::time::Duration;

use rhcs_client::ApiError;

use crate::attr::ConversionError;
use crate::version::VersionParseError;

/// Errors produced while validating, polling, or reconciling.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    VersionParse(#[from] VersionParseError),

    #[error(
        "version '{version}' is not supported with default ingress, \
         minimum supported version is {minimum}"
    )]
    UnsupportedVersion { version: String, minimum: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("timed out after {elapsed:?} waiting for '{object}'")]
    Timeout { object: String, elapsed: Duration },

    #[error("cancelled while waiting for '{object}'")]
    Cancelled { object: String },

    #[error(
        "{operation} failed for '{resource_id}'{}: {source}",
        sub_resource_suffix(.sub_resource_id)
    )]
    RemoteCall {
        operation: &'static str,
        resource_id: String,
        sub_resource_id: Option<String>,
        #[source]
        source: ApiError,
    },
}

fn sub_resource_suffix(sub_resource_id: &Option<String>) -> String {
    match sub_resource_id {
        Some(id) => format!(" (sub-resource '{}')", id),
        None => String::new(),
    }
}

impl ReconcileError {
    /// Wrap a client failure with the call context.
    pub fn remote(
        operation: &'static str,
        resource_id: &str,
        sub_resource_id: Option<&str>,
        source: ApiError,
    ) -> Self {
        ReconcileError::RemoteCall {
            operation,
            resource_id: resource_id.to_string(),
            sub_resource_id: sub_resource_id.map(str::to_string),
            source,
        }
    }

    /// Whether the error was raised before any remote call was attempted.
    pub fn is_gate_failure(&self) -> bool {
        matches!(
            self,
            ReconcileError::Conversion(_)
                | ReconcileError::VersionParse(_)
                | ReconcileError::UnsupportedVersion { .. }
                | ReconcileError::InvalidConfiguration(_)
        )
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
