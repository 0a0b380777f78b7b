//! Validator collaborators.
//!
//! A form-level [`Validate`] sees the whole value tree and returns errors for
//! any number of fields, either as a nested tree or as a flat map. A
//! [`FieldValidate`] is registered for one path and returns that field's
//! error only. Both may be asynchronous; a raised [`HookError`] is a failure of
//! the validation pass, not a field error.

use crate::{FieldError, HookError, ValidationOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Form-level validator.
#[async_trait]
pub trait Validate: Send + Sync {
    /// Validate the full value tree.
    async fn validate(&self, values: &Value) -> Result<ValidationOutput, HookError>;
}

/// Per-field validator.
#[async_trait]
pub trait FieldValidate: Send + Sync {
    /// Validate one field. `value` is `None` when the path is absent.
    async fn validate_field(
        &self,
        value: Option<&Value>,
        values: &Value,
    ) -> Result<Option<FieldError>, HookError>;
}

/// Validator backed by a synchronous closure. See [`validator_fn`].
pub struct ValidatorFn<F>(F);

/// Wrap a synchronous closure as a form-level validator.
///
/// ```
/// use form_state::{validator_fn, HookError};
/// use serde_json::{json, Value};
///
/// let v = validator_fn(|values: &Value| -> Result<Value, HookError> {
///     Ok(if values["name"] == "" { json!({"name": "Required"}) } else { json!({}) })
/// });
/// # let _ = v;
/// ```
pub fn validator_fn<F, O>(f: F) -> ValidatorFn<F>
where
    F: Fn(&Value) -> Result<O, HookError> + Send + Sync,
    O: Into<ValidationOutput>,
{
    ValidatorFn(f)
}

#[async_trait]
impl<F, O> Validate for ValidatorFn<F>
where
    F: Fn(&Value) -> Result<O, HookError> + Send + Sync,
    O: Into<ValidationOutput> + 'static,
{
    async fn validate(&self, values: &Value) -> Result<ValidationOutput, HookError> {
        (self.0)(values).map(Into::into)
    }
}

/// Validator backed by an async closure. See [`async_validator_fn`].
pub struct AsyncValidatorFn<F>(F);

/// Wrap an async closure as a form-level validator.
///
/// The closure receives an owned copy of the values so the returned future
/// can be `'static`.
pub fn async_validator_fn<F, Fut, O>(f: F) -> AsyncValidatorFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, HookError>> + Send + 'static,
    O: Into<ValidationOutput> + 'static,
{
    AsyncValidatorFn(f)
}

#[async_trait]
impl<F, Fut, O> Validate for AsyncValidatorFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, HookError>> + Send + 'static,
    O: Into<ValidationOutput> + 'static,
{
    async fn validate(&self, values: &Value) -> Result<ValidationOutput, HookError> {
        (self.0)(values.clone()).await.map(Into::into)
    }
}

/// Field validator backed by a synchronous closure. See [`field_validator_fn`].
pub struct FieldValidatorFn<F>(F);

/// Wrap a synchronous closure as a field validator.
pub fn field_validator_fn<F>(f: F) -> FieldValidatorFn<F>
where
    F: Fn(Option<&Value>, &Value) -> Option<FieldError> + Send + Sync,
{
    FieldValidatorFn(f)
}

#[async_trait]
impl<F> FieldValidate for FieldValidatorFn<F>
where
    F: Fn(Option<&Value>, &Value) -> Option<FieldError> + Send + Sync,
{
    async fn validate_field(
        &self,
        value: Option<&Value>,
        values: &Value,
    ) -> Result<Option<FieldError>, HookError> {
        Ok((self.0)(value, values))
    }
}

/// Field validators chained in order; the first present error wins.
#[derive(Clone)]
pub struct ComposedValidator {
    validators: Vec<Arc<dyn FieldValidate>>,
}

impl std::fmt::Debug for ComposedValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedValidator")
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[async_trait]
impl FieldValidate for ComposedValidator {
    async fn validate_field(
        &self,
        value: Option<&Value>,
        values: &Value,
    ) -> Result<Option<FieldError>, HookError> {
        for validator in &self.validators {
            if let Some(error) = validator.validate_field(value, values).await? {
                return Ok(Some(error));
            }
        }
        Ok(None)
    }
}

/// Chain optional field validators.
///
/// Missing entries are skipped; `None` is returned when nothing is left.
/// Later validators only run while earlier ones report no error.
pub fn compose_validators<I>(validators: I) -> Option<ComposedValidator>
where
    I: IntoIterator<Item = Option<Arc<dyn FieldValidate>>>,
{
    let validators: Vec<_> = validators.into_iter().flatten().collect();
    if validators.is_empty() {
        None
    } else {
        Some(ComposedValidator { validators })
    }
}
