//! Submit collaborator.

use crate::HookError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// Receives the form's values once validation has passed.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: Value) -> Result<(), HookError>;
}

/// Submit handler backed by an async closure. See [`submit_fn`].
pub struct SubmitFn<F>(F);

/// Wrap an async closure as a submit handler.
pub fn submit_fn<F, Fut>(f: F) -> SubmitFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    SubmitFn(f)
}

#[async_trait]
impl<F, Fut> SubmitHandler for SubmitFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    async fn submit(&self, values: Value) -> Result<(), HookError> {
        (self.0)(values).await
    }
}

/// How a `submit()` call ended, when it did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Validation passed and the submit handler (if any) completed.
    Submitted,
    /// Validation found errors; the failed-submit hook ran instead.
    Invalid,
    /// Another submit was still in progress; nothing was done.
    AlreadySubmitting,
}
