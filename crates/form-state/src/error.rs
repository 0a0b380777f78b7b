//! Error types for form operations.
//!
//! Field validation errors are data, not failures: they live in the form's
//! error map as [`FieldError`](crate::FieldError) values. The types here cover
//! the exceptional cases, where a collaborator (validator or submit handler)
//! itself fails.

use thiserror::Error;

/// Result type alias for form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Failure reported by a user-supplied collaborator (validator, field
/// validator or submit handler).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HookError {
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        HookError::ExecutionFailed(message.into())
    }
}

/// Errors surfaced by [`Form`](crate::Form) operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// The validator raised instead of returning field errors.
    #[error("validator failed: {0}")]
    Validator(#[source] HookError),

    /// The submit handler raised after validation passed.
    #[error("submit handler failed: {0}")]
    Submit(#[source] HookError),

    /// Converting a typed model into a value tree failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FormError {
    /// Whether this error came from the validation pass.
    #[inline]
    pub fn is_validator(&self) -> bool {
        matches!(self, FormError::Validator(_))
    }
}
