//! Structured tool errors.
//!
//! Tool faults are data, not exceptions: a failed dispatch yields a
//! [`ToolError`] that callers embed as the `error` field of an otherwise
//! successful result, keeping the conversation alive.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use tripsync_lib::Error as LibError;

/// Result type for tool dispatch.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// A structured tool error with a machine-readable kind and optional context.
#[derive(Debug, Error, Serialize, Deserialize, Clone)]
#[error("{message}")]
pub struct ToolError {
    /// Error taxonomy kind (e.g., "validation_error", "payment_state_error").
    pub kind: String,

    /// Human-readable error message.
    pub message: String,

    /// Additional error context (e.g., the offending parameter).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ToolError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            context: None,
        }
    }

    /// Add context information as JSON.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// A tool name that is not in the registry.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new("unknown_tool", format!("Unknown tool '{name}'")).with_context(json!({
            "tool": name,
        }))
    }

    /// A missing or malformed argument.
    pub fn validation(param: impl Into<String>, reason: impl Into<String>) -> Self {
        let param = param.into();
        Self::new(
            "validation_error",
            format!("Invalid argument '{param}'"),
        )
        .with_context(json!({
            "parameter": param,
            "reason": reason.into(),
        }))
    }

    /// A payment operation attempted from the wrong state.
    pub fn payment_state(state: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            "payment_state_error",
            format!("Payment operation rejected: {}", reason.into()),
        )
        .with_context(json!({
            "state": state.into(),
        }))
    }

    /// Whether this error denotes a tool name missing from the registry.
    pub fn is_unknown_tool(&self) -> bool {
        self.kind == "unknown_tool"
    }
}

impl From<LibError> for ToolError {
    fn from(err: LibError) -> Self {
        match err {
            LibError::InvalidArgument { name, reason } => Self::validation(name, reason),
            LibError::PaymentState { state, reason } => {
                Self::payment_state(state.to_string(), reason)
            }
            other => Self::new("internal_error", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_parameter_context() {
        let err = ToolError::validation("location", "cannot be empty");
        assert_eq!(err.kind, "validation_error");
        assert!(err.message.contains("location"));

        let context = err.context.expect("context present");
        assert_eq!(context["parameter"], "location");
        assert_eq!(context["reason"], "cannot be empty");
    }

    #[test]
    fn unknown_tool_is_distinguishable() {
        assert!(ToolError::unknown_tool("nope").is_unknown_tool());
        assert!(!ToolError::validation("x", "y").is_unknown_tool());
    }

    #[test]
    fn lib_payment_error_converts() {
        let lib_err = LibError::PaymentState {
            state: tripsync_lib::PaymentState::None,
            reason: "confirm requires a pending quote".to_string(),
        };
        let err = ToolError::from(lib_err);

        assert_eq!(err.kind, "payment_state_error");
        assert_eq!(err.context.expect("context")["state"], "none");
    }

    #[test]
    fn serializes_without_null_context() {
        let err = ToolError::new("internal_error", "boom");
        let json = serde_json::to_string(&err).expect("serialize");
        assert!(!json.contains("context"));
    }
}
