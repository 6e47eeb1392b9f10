use thiserror::Error;

use crate::config::READONLY_ENV_VAR;

/// Transport-level errors for the JSON-RPC/MCP layer.
#[derive(Error, Debug)]
pub enum McpError {
    #[error("JSON-RPC error: {0}")]
    JsonRpc(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, McpError>;

/// Classification of a provider-reported fault, preserved so a calling
/// agent can decide whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    Throttling,
    ResourceNotFound,
    ResourceInUse,
    LimitExceeded,
    AccessDenied,
    Validation,
    ExpiredIterator,
    Timeout,
    Connection,
    Internal,
}

impl RemoteErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Throttling => "Throttling",
            Self::ResourceNotFound => "ResourceNotFound",
            Self::ResourceInUse => "ResourceInUse",
            Self::LimitExceeded => "LimitExceeded",
            Self::AccessDenied => "AccessDenied",
            Self::Validation => "Validation",
            Self::ExpiredIterator => "ExpiredIterator",
            Self::Timeout => "Timeout",
            Self::Connection => "Connection",
            Self::Internal => "Internal",
        }
    }
}

/// Errors surfaced by tool invocations.
///
/// Guard and validation failures are raised before any remote call is
/// issued. Remote faults keep the original provider error code so they are
/// never collapsed into a generic failure. Partial batch failures are not
/// an error: `put_records` surfaces per-record status in its normalized
/// response instead.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Mutation not allowed: operation '{operation}' is blocked because {READONLY_ENV_VAR} is set to true")]
    ReadOnlyViolation { operation: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{operation} failed ({}): {message}", .kind.as_str())]
    Remote {
        operation: &'static str,
        kind: RemoteErrorKind,
        /// Provider error code, e.g. `ResourceNotFoundException`.
        code: Option<String>,
        message: String,
    },

    #[error("Tool '{0}' not found")]
    UnknownTool(String),
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;

impl ToolError {
    /// Top-level taxonomy kind for the structured error object.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReadOnlyViolation { .. } => "ReadOnlyViolation",
            Self::InvalidParameter(_) => "InvalidParameter",
            Self::Remote { .. } => "RemoteServiceError",
            Self::UnknownTool(_) => "UnknownTool",
        }
    }

    /// Structured error object returned to the caller.
    pub fn to_json(&self) -> serde_json::Value {
        let mut error = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Self::Remote { kind, code, .. } = self {
            error["remoteKind"] = serde_json::Value::from(kind.as_str());
            if let Some(code) = code {
                error["code"] = serde_json::Value::from(code.as_str());
            }
        }
        serde_json::json!({ "error": error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_violation_names_the_env_control() {
        let err = ToolError::ReadOnlyViolation {
            operation: "create_stream".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("create_stream"));
        assert!(text.contains(READONLY_ENV_VAR));
    }

    #[test]
    fn remote_error_json_preserves_provider_code() {
        let err = ToolError::Remote {
            operation: "put_record",
            kind: RemoteErrorKind::Throttling,
            code: Some("ProvisionedThroughputExceededException".to_string()),
            message: "slow down".to_string(),
        };
        let json = err.to_json();
        assert_eq!(json["error"]["kind"], "RemoteServiceError");
        assert_eq!(json["error"]["remoteKind"], "Throttling");
        assert_eq!(json["error"]["code"], "ProvisionedThroughputExceededException");
    }

    #[test]
    fn kinds_are_distinguishable() {
        assert_eq!(
            ToolError::InvalidParameter("x".into()).to_json()["error"]["kind"],
            "InvalidParameter"
        );
        assert_eq!(
            ToolError::UnknownTool("x".into()).to_json()["error"]["kind"],
            "UnknownTool"
        );
    }
}
