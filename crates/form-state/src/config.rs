//! Form configuration.
//!
//! [`FormOptions`] holds the plain, serializable switches. [`FormConfig`] is
//! the builder handed to [`Form::new`](crate::Form::new): initial values,
//! options and the collaborator hooks.

use crate::{Debounce, FormResult, SubmitHandler, Validate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Behavioural switches of a form.
///
/// Deserializes from camelCase keys, with every key optional:
///
/// ```
/// use form_state::{Debounce, FormOptions};
/// use std::time::Duration;
///
/// let opts: FormOptions = serde_json::from_str(
///     r#"{"validateOnBlur": false, "validateDebounce": {"wait": 50}}"#,
/// ).unwrap();
/// assert!(opts.validate_on_change);
/// assert!(!opts.validate_on_blur);
/// assert_eq!(opts.validate_debounce, Debounce::trailing(Duration::from_millis(50)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormOptions {
    /// Validate after every value change.
    pub validate_on_change: bool,
    /// Validate when a field is blurred.
    pub validate_on_blur: bool,
    /// Debounce applied to change- and blur-triggered validation.
    pub validate_debounce: Debounce,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_change: true,
            validate_on_blur: true,
            validate_debounce: Debounce::Disabled,
        }
    }
}

impl FormOptions {
    pub fn with_validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = enabled;
        self
    }

    pub fn with_validate_on_blur(mut self, enabled: bool) -> Self {
        self.validate_on_blur = enabled;
        self
    }

    pub fn with_debounce(mut self, debounce: impl Into<Debounce>) -> Self {
        self.validate_debounce = debounce.into();
        self
    }
}

/// Source of the initial value tree, evaluated once at construction.
pub enum InitialValues {
    Value(Value),
    Producer(Box<dyn FnOnce() -> Value + Send>),
}

impl InitialValues {
    pub(crate) fn produce(self) -> Value {
        match self {
            InitialValues::Value(value) => value,
            InitialValues::Producer(producer) => producer(),
        }
    }
}

impl Default for InitialValues {
    fn default() -> Self {
        InitialValues::Value(Value::Object(Default::default()))
    }
}

impl std::fmt::Debug for InitialValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitialValues::Value(value) => f.debug_tuple("Value").field(value).finish(),
            InitialValues::Producer(_) => f.debug_tuple("Producer").finish(),
        }
    }
}

/// Hook run when `submit()` finds validation errors.
pub type FailedSubmitHandler = Arc<dyn Fn() + Send + Sync>;

/// Everything needed to build a [`Form`](crate::Form).
#[derive(Default)]
pub struct FormConfig {
    pub(crate) initial_values: InitialValues,
    pub(crate) options: FormOptions,
    pub(crate) validator: Option<Arc<dyn Validate>>,
    pub(crate) on_submit: Option<Arc<dyn SubmitHandler>>,
    pub(crate) on_failed_submit: Option<FailedSubmitHandler>,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the form with a value tree (copied into the form).
    pub fn with_initial_values(mut self, values: Value) -> Self {
        self.initial_values = InitialValues::Value(values);
        self
    }

    /// Seed the form lazily; the producer runs once, inside `Form::new`.
    pub fn with_initial_values_fn<F>(mut self, producer: F) -> Self
    where
        F: FnOnce() -> Value + Send + 'static,
    {
        self.initial_values = InitialValues::Producer(Box::new(producer));
        self
    }

    /// Seed the form from a typed model.
    pub fn with_initial_model<T: Serialize>(self, model: &T) -> FormResult<Self> {
        let values = serde_json::to_value(model)?;
        Ok(self.with_initial_values(values))
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_validator(mut self, validator: impl Validate + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_submit_handler(mut self, handler: impl SubmitHandler + 'static) -> Self {
        self.on_submit = Some(Arc::new(handler));
        self
    }

    pub fn with_failed_submit_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_failed_submit = Some(Arc::new(handler));
        self
    }
}

impl std::fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormConfig")
            .field("initial_values", &self.initial_values)
            .field("options", &self.options)
            .field("validator", &self.validator.is_some())
            .field("on_submit", &self.on_submit.is_some())
            .field("on_failed_submit", &self.on_failed_submit.is_some())
            .finish()
    }
}
