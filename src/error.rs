//! Error types for the Targetprocess MCP server.
//!
//! This module defines `TpError`, the unified error type used throughout
//! the crate. Every variant maps to a stable error *kind* string so tool
//! handlers can hand the failure back to the assistant as structured JSON.
//!
//! # Security
//!
//! Error messages built from remote responses may echo request data. Use
//! `sanitize_message()` / `sanitized_display()` with the session's secrets
//! before logging or returning them.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

/// Unified error type for all Targetprocess operations.
#[derive(Error, Debug)]
pub enum TpError {
    /// Configuration error - missing or contradictory settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input validation failed before any request was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Request timed out.
    #[error("request timed out after {duration:?} during {operation}")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// Targetprocess returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The response body, usually an error document from Targetprocess.
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// An entity, user or state did not resolve.
    #[error("{what} not found")]
    NotFound {
        /// Description of what was looked up (e.g. "UserStory 42").
        what: String,
    },
}

impl TpError {
    /// Creates a configuration error for a missing setting.
    pub fn missing_setting(name: &str) -> Self {
        TpError::Config(format!(
            "{} not found in environment variables or config file",
            name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        TpError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        TpError::Validation(message.into())
    }

    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        TpError::NotFound { what: what.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        TpError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Returns the error kind reported across the tool boundary.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            TpError::Config(_) => "ConfigurationError",
            TpError::Validation(_) => "ValidationError",
            TpError::Http(_) | TpError::HttpClient(_) | TpError::Timeout { .. } => {
                "TransportError"
            }
            TpError::HttpStatus { .. } => "RemoteHTTPError",
            TpError::Decode(_) => "DecodeError",
            TpError::NotFound { .. } => "NotFoundError",
        }
    }

    /// Returns true for a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, TpError::NotFound { .. })
    }

    /// Replaces every occurrence of each secret in `message` with `[REDACTED]`.
    ///
    /// Empty secrets are ignored.
    #[must_use]
    pub fn sanitize_message(message: &str, secrets: &[&str]) -> String {
        secrets
            .iter()
            .filter(|s| !s.is_empty())
            .fold(message.to_string(), |acc, secret| {
                acc.replace(secret, "[REDACTED]")
            })
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secrets: &[&str]) -> String {
        Self::sanitize_message(&self.to_string(), secrets)
    }

    /// Converts the error into the JSON object returned by tools.
    ///
    /// Remote HTTP errors additionally carry `status` and `body`.
    #[must_use]
    pub fn to_tool_error(&self, secrets: &[&str]) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.sanitized_display(secrets),
        });
        if let TpError::HttpStatus { status, body } = self {
            error["status"] = json!(status.as_u16());
            error["body"] = json!(Self::sanitize_message(body, secrets));
        }
        json!({ "error": error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_setting_error() {
        let err = TpError::missing_setting("TARGETPROCESS_URL");
        assert!(err.to_string().contains("TARGETPROCESS_URL not found"));
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn test_validation_error() {
        let err = TpError::validation("name is required");
        assert_eq!(err.to_string(), "validation error: name is required");
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn test_not_found_error() {
        let err = TpError::not_found("State 'Shipped' for Task");
        assert_eq!(err.to_string(), "State 'Shipped' for Task not found");
        assert!(err.is_not_found());
        assert_eq!(err.kind(), "NotFoundError");
    }

    #[test]
    fn test_timeout_error() {
        let err = TpError::timeout(Duration::from_secs(30), "GET UserStories");
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("30s"));
        assert_eq!(err.kind(), "TransportError");
    }

    #[test]
    fn test_decode_error_kind() {
        let err: TpError = serde_json::from_str::<Value>("not json").unwrap_err().into();
        assert_eq!(err.kind(), "DecodeError");
    }

    #[test]
    fn test_sanitize_message_removes_secrets() {
        let sanitized = TpError::sanitize_message(
            "token abc123 and password hunter2 rejected",
            &["abc123", "hunter2"],
        );
        assert_eq!(sanitized, "token [REDACTED] and password [REDACTED] rejected");
    }

    #[test]
    fn test_sanitize_message_ignores_empty_secret() {
        let message = "Some error message";
        assert_eq!(TpError::sanitize_message(message, &[""]), message);
    }

    #[test]
    fn test_tool_error_for_remote_http() {
        let err = TpError::HttpStatus {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "bad where clause near tok3n".to_string(),
        };
        let value = err.to_tool_error(&["tok3n"]);
        assert_eq!(value["error"]["kind"], "RemoteHTTPError");
        assert_eq!(value["error"]["status"], 400);
        assert_eq!(value["error"]["body"], "bad where clause near [REDACTED]");
    }

    #[test]
    fn test_tool_error_without_status() {
        let value = TpError::not_found("UserStory 7").to_tool_error(&[]);
        assert_eq!(value["error"]["kind"], "NotFoundError");
        assert!(value["error"].get("status").is_none());
    }
}
