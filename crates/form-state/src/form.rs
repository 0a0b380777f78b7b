//! The form aggregate.
//!
//! [`Form`] owns the value tree, the flat error and touched maps and the
//! validation runner behind a single mutex. Every operation locks once, applies
//! its change and releases the lock before anything is awaited, so reads
//! between two suspension points always see every write issued so far.
//! Validators and the submit handler run outside the lock and re-acquire it
//! only to apply their results.
//!
//! Collaborators are read from their slots when a run executes, not when it is
//! scheduled, so swapping the validator also affects validations already
//! waiting on a debounce.

use crate::validation::run_validation_pass;
use crate::{
    assign_at_path, build_path_map, get_at_path, has_errors, is_error, merge_field_errors,
    parse_path, path_is_within, ErrorMap, FailedSubmitHandler, FieldError, FieldValidate,
    FieldWatch, FormConfig, FormError, FormEvent, FormOptions, FormResult, Schedule,
    SubmitHandler, SubmitOutcome, Ticket, TouchedMap, Validate, ValidationRunner,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio::time::Instant;

const EVENT_CAPACITY: usize = 256;

/// Point-in-time copy of a form's observable state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub values: Value,
    pub valid_values: Value,
    pub submitted_values: Option<Value>,
    pub errors: ErrorMap,
    pub touched: TouchedMap,
    pub is_submitting: bool,
    pub is_validating: bool,
    pub is_dirty: bool,
    pub is_valid: bool,
}

struct FormData {
    /// Tree from the configuration; what argument-less resets return to.
    original: Value,
    /// Baseline for `is_dirty`.
    initial: Value,
    values: Value,
    valid_values: Value,
    /// `valid_values` reflects a completed validation (or a reset asserting validity).
    validated: bool,
    submitted_values: Option<Value>,
    errors: ErrorMap,
    touched: TouchedMap,
    is_submitting: bool,
    options: FormOptions,
    runner: ValidationRunner,
}

#[derive(Clone, Default)]
struct Hooks {
    validator: Option<Arc<dyn Validate>>,
    field_validators: BTreeMap<String, Arc<dyn FieldValidate>>,
    on_submit: Option<Arc<dyn SubmitHandler>>,
    on_failed_submit: Option<FailedSubmitHandler>,
}

impl Hooks {
    fn has_validators(&self) -> bool {
        self.validator.is_some() || !self.field_validators.is_empty()
    }
}

struct FormInner {
    state: Mutex<FormData>,
    hooks: RwLock<Hooks>,
    events: broadcast::Sender<FormEvent>,
}

/// Handle to a form's state.
///
/// Cloning is cheap and every clone addresses the same form. Spawned
/// validation tasks hold a clone to apply their results.
///
/// # Examples
///
/// ```
/// use form_state::{Form, FormConfig};
/// use serde_json::json;
///
/// let form = Form::new(FormConfig::new().with_initial_values(json!({
///     "name": "bill",
///     "friends": [{"name": "bax", "age": 23}],
/// })));
///
/// form.set_field_value("friends.0.name", "robin");
/// assert_eq!(form.get_field_value("friends.0.name"), Some(json!("robin")));
/// assert_eq!(form.get_field_value("friends.0.age"), Some(json!(23)));
/// assert!(form.is_dirty());
/// ```
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl Form {
    /// Build a form. The initial tree is evaluated once and owned by the form.
    pub fn new(config: FormConfig) -> Self {
        let FormConfig {
            initial_values,
            options,
            validator,
            on_submit,
            on_failed_submit,
        } = config;

        let original = initial_values.produce();
        let data = FormData {
            initial: original.clone(),
            values: original.clone(),
            valid_values: original.clone(),
            original,
            validated: false,
            submitted_values: None,
            errors: ErrorMap::new(),
            touched: TouchedMap::new(),
            is_submitting: false,
            options,
            runner: ValidationRunner::new(options.validate_debounce),
        };
        let hooks = Hooks {
            validator,
            field_validators: BTreeMap::new(),
            on_submit,
            on_failed_submit,
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(FormInner {
                state: Mutex::new(data),
                hooks: RwLock::new(hooks),
                events,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormData> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn hooks(&self) -> Hooks {
        self.inner
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_hooks(&self, f: impl FnOnce(&mut Hooks)) {
        let mut hooks = self
            .inner
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut hooks);
    }

    fn emit(&self, event: FormEvent) {
        // No receivers is fine.
        let _ = self.inner.events.send(event);
    }

    // ===== Reads =====

    /// Copy of the live value tree.
    pub fn values(&self) -> Value {
        self.lock().values.clone()
    }

    /// Copy of the dirty-comparison baseline.
    pub fn initial_values(&self) -> Value {
        self.lock().initial.clone()
    }

    /// Values as of the last applied validation.
    pub fn valid_values(&self) -> Value {
        self.lock().valid_values.clone()
    }

    /// Values as of the last successful submit, if any.
    pub fn submitted_values(&self) -> Option<Value> {
        self.lock().submitted_values.clone()
    }

    pub fn get_field_value(&self, path: &str) -> Option<Value> {
        get_at_path(&self.lock().values, &parse_path(path)).cloned()
    }

    pub fn errors(&self) -> ErrorMap {
        self.lock().errors.clone()
    }

    /// The stored error at `path`, exactly as stored.
    pub fn get_field_error_raw(&self, path: &str) -> Option<FieldError> {
        self.lock().errors.get(path).cloned()
    }

    /// The first message at `path`.
    pub fn get_field_error(&self, path: &str) -> Option<String> {
        self.lock()
            .errors
            .get(path)
            .and_then(FieldError::first)
            .map(str::to_owned)
    }

    /// All messages at `path`; a single message comes back as a one-item list.
    pub fn get_field_errors(&self, path: &str) -> Option<Vec<String>> {
        self.lock().errors.get(path).map(FieldError::messages)
    }

    pub fn touched(&self) -> TouchedMap {
        self.lock().touched.clone()
    }

    /// Whether `path` was marked touched. Unvisited paths read as `false`.
    pub fn is_field_touched(&self, path: &str) -> bool {
        self.lock().touched.get(path).copied().unwrap_or(false)
    }

    pub fn is_field_valid(&self, path: &str) -> bool {
        !is_error(self.lock().errors.get(path))
    }

    /// Whether the values differ from the baseline set at creation or reset.
    pub fn is_dirty(&self) -> bool {
        let data = self.lock();
        data.values != data.initial
    }

    /// Whether no entry of the error map is an error.
    pub fn is_valid(&self) -> bool {
        !has_errors(&self.lock().errors)
    }

    pub fn is_validating(&self) -> bool {
        self.lock().runner.is_validating()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().is_submitting
    }

    pub fn options(&self) -> FormOptions {
        self.lock().options
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let data = self.lock();
        FormSnapshot {
            values: data.values.clone(),
            valid_values: data.valid_values.clone(),
            submitted_values: data.submitted_values.clone(),
            errors: data.errors.clone(),
            touched: data.touched.clone(),
            is_submitting: data.is_submitting,
            is_validating: data.runner.is_validating(),
            is_dirty: data.values != data.initial,
            is_valid: !has_errors(&data.errors),
        }
    }

    // ===== Values =====

    /// Write a value at `path`, then validate if enabled and something changed.
    ///
    /// Returns whether the tree changed.
    pub fn set_field_value(&self, path: &str, value: impl Into<Value>) -> bool {
        self.write_field(path, Some(value.into()))
    }

    /// Delete the value at `path`, pruning containers left empty.
    pub fn unset_field_value(&self, path: &str) -> bool {
        self.write_field(path, None)
    }

    fn write_field(&self, path: &str, value: Option<Value>) -> bool {
        let parsed = parse_path(path);
        let schedule = {
            let mut data = self.lock();
            if !assign_at_path(&mut data.values, &parsed, value) {
                return false;
            }
            if data.options.validate_on_change {
                self.schedule_locked(&mut data)
            } else {
                None
            }
        };

        self.emit(FormEvent::Values {
            path: Some(path.to_string()),
        });
        if let Some(schedule) = schedule {
            self.dispatch(schedule);
        }
        true
    }

    /// Replace the whole value tree.
    pub fn set_values(&self, values: Value) {
        let schedule = {
            let mut data = self.lock();
            if data.values == values {
                return;
            }
            data.values = values;
            if data.options.validate_on_change {
                self.schedule_locked(&mut data)
            } else {
                None
            }
        };

        self.emit(FormEvent::Values { path: None });
        if let Some(schedule) = schedule {
            self.dispatch(schedule);
        }
    }

    // ===== Errors =====

    /// Store `error` at `path`; `None` removes the entry.
    ///
    /// An empty list is stored as such. It reads as "no error" but stays
    /// distinguishable from an absent entry.
    pub fn set_field_error(&self, path: &str, error: Option<FieldError>) {
        {
            let mut data = self.lock();
            match error {
                Some(error) => {
                    data.errors.insert(path.to_string(), error);
                }
                None => {
                    data.errors.remove(path);
                }
            }
        }
        self.emit(FormEvent::Errors {
            path: Some(path.to_string()),
        });
    }

    /// Merge `error` onto the entry at `path`.
    ///
    /// `None` and an empty list leave the map untouched.
    pub fn add_field_error(&self, path: &str, error: Option<FieldError>) {
        let error = match error {
            Some(error) if !error.is_empty_list() => error,
            _ => return,
        };
        {
            let mut data = self.lock();
            let existing = data.errors.remove(path);
            if let Some(merged) = merge_field_errors([existing, Some(error)]) {
                data.errors.insert(path.to_string(), merged);
            }
        }
        self.emit(FormEvent::Errors {
            path: Some(path.to_string()),
        });
    }

    /// Replace the whole error map.
    pub fn set_errors(&self, errors: ErrorMap) {
        self.lock().errors = errors;
        self.emit(FormEvent::Errors { path: None });
    }

    // ===== Touched =====

    pub fn set_field_touched(&self, path: &str, touched: bool) {
        self.lock().touched.insert(path.to_string(), touched);
        self.emit(FormEvent::Touched {
            path: Some(path.to_string()),
        });
    }

    /// Mark `path` touched.
    pub fn touch_field(&self, path: &str) {
        self.set_field_touched(path, true);
    }

    /// Replace the whole touched map.
    pub fn set_touched(&self, touched: TouchedMap) {
        self.lock().touched = touched;
        self.emit(FormEvent::Touched { path: None });
    }

    /// Mark `path` touched and validate if `validate_on_blur` is set.
    pub fn blur_field(&self, path: &str) {
        let schedule = {
            let mut data = self.lock();
            data.touched.insert(path.to_string(), true);
            if data.options.validate_on_blur {
                self.schedule_locked(&mut data)
            } else {
                None
            }
        };

        self.emit(FormEvent::Touched {
            path: Some(path.to_string()),
        });
        if let Some(schedule) = schedule {
            self.dispatch(schedule);
        }
    }

    // ===== Validation =====

    /// Schedule a change- or blur-triggered run, if there is anything to do.
    fn schedule_locked(&self, data: &mut FormData) -> Option<Schedule> {
        if !self.hooks().has_validators() {
            return None;
        }
        if data.validated && !data.runner.is_validating() && data.values == data.valid_values {
            tracing::trace!("values already validated, skipping");
            return None;
        }
        let schedule = data.runner.schedule(Instant::now());
        tracing::debug!(
            seq = schedule.ticket().seq(),
            deferred = matches!(schedule, Schedule::Deferred { .. }),
            "validation scheduled"
        );
        Some(schedule)
    }

    /// Run a scheduled validation in the background.
    fn dispatch(&self, schedule: Schedule) {
        let ticket = schedule.ticket();
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(seq = ticket.seq(), "no async runtime, validation skipped");
            self.lock().runner.settle(ticket);
            return;
        };

        let form = self.clone();
        handle.spawn(async move {
            if let Schedule::Deferred { wait, .. } = schedule {
                tokio::time::sleep(wait).await;
                if !form.lock().runner.is_current(ticket) {
                    tracing::trace!(seq = ticket.seq(), "debounced validation superseded");
                    return;
                }
            }
            if let Err(error) = form.run_validation(ticket).await {
                tracing::warn!(error = %error, "background validation failed");
            }
        });
    }

    /// Execute the run for `ticket` and apply its result if still current.
    ///
    /// Returns `Ok(None)` when the result was discarded as stale.
    async fn run_validation(&self, ticket: Ticket) -> FormResult<Option<ErrorMap>> {
        let seq = ticket.seq();
        let values = self.lock().values.clone();
        let hooks = self.hooks();
        self.emit(FormEvent::ValidationStarted { seq });

        let result = if hooks.has_validators() {
            let field_validators = hooks.field_validators.into_iter().collect();
            Some(run_validation_pass(hooks.validator, field_validators, &values).await)
        } else {
            None
        };

        let mut data = self.lock();
        if !data.runner.settle(ticket) {
            let latest = data.runner.latest_seq();
            drop(data);
            tracing::debug!(seq, latest, "discarding stale validation result");
            self.emit(FormEvent::ValidationDiscarded { seq });
            return Ok(None);
        }

        match result {
            Some(Err(error)) => {
                drop(data);
                tracing::warn!(seq, error = %error, "validator failed");
                self.emit(FormEvent::ValidationFailed {
                    seq,
                    error: error.to_string(),
                });
                Err(FormError::Validator(error))
            }
            Some(Ok(errors)) => {
                data.errors = errors.clone();
                data.valid_values = values;
                data.validated = true;
                drop(data);
                tracing::debug!(seq, errors = errors.len(), "validation applied");
                self.emit(FormEvent::Errors { path: None });
                self.emit(FormEvent::ValidationFinished { seq });
                Ok(Some(errors))
            }
            None => {
                data.valid_values = values;
                data.validated = true;
                let errors = data.errors.clone();
                drop(data);
                self.emit(FormEvent::ValidationFinished { seq });
                Ok(Some(errors))
            }
        }
    }

    /// Validate now, bypassing debounce and superseding pending runs.
    ///
    /// Resolves with the error map this run applied. If a newer run was
    /// scheduled meanwhile, this run's result is discarded and the current
    /// error map is returned instead. Without any validator the error map is
    /// left as it is and returned.
    pub async fn validate(&self) -> FormResult<ErrorMap> {
        let ticket = self.lock().runner.force();
        match self.run_validation(ticket).await? {
            Some(errors) => Ok(errors),
            None => Ok(self.errors()),
        }
    }

    // ===== Reset =====

    /// Reset values and baseline to `values` (or the configured initial tree)
    /// and clear errors and touched flags.
    pub fn reset(&self, values: Option<Value>) {
        self.reset_inner(values, true);
    }

    /// Like [`reset`](Self::reset) but keeps errors and touched flags, for
    /// re-displaying a known-bad state.
    pub fn reset_preserving_errors(&self, values: Option<Value>) {
        self.reset_inner(values, false);
    }

    fn reset_inner(&self, values: Option<Value>, is_valid: bool) {
        {
            let mut data = self.lock();
            let values = values.unwrap_or_else(|| data.original.clone());
            data.runner.invalidate();
            data.initial = values.clone();
            if is_valid {
                data.errors.clear();
                data.touched.clear();
                data.valid_values = values.clone();
            }
            data.validated = is_valid;
            data.values = values;
        }
        tracing::debug!(is_valid, "form reset");
        self.emit(FormEvent::Reset);
    }

    /// Reset the sub-tree at `path` to `value` (or its configured initial
    /// value) and clear error and touched entries at and below `path`.
    ///
    /// The baseline is rebased at `path` too, so the field reads as pristine.
    pub fn reset_field(&self, path: &str, value: Option<Value>) {
        let parsed = parse_path(path);
        {
            let mut data = self.lock();
            let target = value.or_else(|| get_at_path(&data.original, &parsed).cloned());
            assign_at_path(&mut data.values, &parsed, target.clone());
            assign_at_path(&mut data.initial, &parsed, target);
            data.errors.retain(|key, _| !path_is_within(key, path));
            data.touched.retain(|key, _| !path_is_within(key, path));
        }

        let path = Some(path.to_string());
        self.emit(FormEvent::Values { path: path.clone() });
        self.emit(FormEvent::Errors { path: path.clone() });
        self.emit(FormEvent::Touched { path });
    }

    // ===== Submit =====

    /// Validate and, if valid, hand a copy of the values to the submit handler.
    ///
    /// Every path of the current values is marked touched first. Invalid
    /// values run the failed-submit hook and resolve normally with
    /// [`SubmitOutcome::Invalid`]. A call made while another submit is in
    /// progress does nothing and resolves with
    /// [`SubmitOutcome::AlreadySubmitting`].
    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        {
            let mut data = self.lock();
            if data.is_submitting {
                tracing::debug!("submit ignored, already submitting");
                return Ok(SubmitOutcome::AlreadySubmitting);
            }
            data.is_submitting = true;
            let all_paths = build_path_map(&data.values, true, true);
            data.touched.extend(all_paths);
        }
        let _submitting = SubmittingGuard(self);
        self.emit(FormEvent::SubmitStarted);
        self.emit(FormEvent::Touched { path: None });

        let errors = self.validate().await?;
        if has_errors(&errors) {
            self.lock().submitted_values = None;
            tracing::debug!(errors = errors.len(), "submit blocked by validation errors");
            if let Some(on_failed_submit) = self.hooks().on_failed_submit {
                on_failed_submit();
            }
            return Ok(SubmitOutcome::Invalid);
        }

        let values = {
            let mut data = self.lock();
            data.submitted_values = Some(data.values.clone());
            data.values.clone()
        };
        if let Some(on_submit) = self.hooks().on_submit {
            on_submit.submit(values).await.map_err(FormError::Submit)?;
        }
        tracing::debug!("form submitted");
        Ok(SubmitOutcome::Submitted)
    }

    // ===== Configuration =====

    /// Replace the form validator. Runs that have not executed yet use it.
    pub fn set_validator(&self, validator: impl Validate + 'static) {
        let validator: Arc<dyn Validate> = Arc::new(validator);
        self.update_hooks(|hooks| hooks.validator = Some(validator));
    }

    pub fn clear_validator(&self) {
        self.update_hooks(|hooks| hooks.validator = None);
    }

    /// Register (or replace) the validator for one field.
    pub fn register_field_validator(&self, path: &str, validator: impl FieldValidate + 'static) {
        let validator: Arc<dyn FieldValidate> = Arc::new(validator);
        self.update_hooks(|hooks| {
            hooks.field_validators.insert(path.to_string(), validator);
        });
    }

    /// Remove the validator for one field. Returns whether one was registered.
    pub fn unregister_field_validator(&self, path: &str) -> bool {
        let mut removed = false;
        self.update_hooks(|hooks| removed = hooks.field_validators.remove(path).is_some());
        removed
    }

    pub fn set_submit_handler(&self, handler: impl SubmitHandler + 'static) {
        let handler: Arc<dyn SubmitHandler> = Arc::new(handler);
        self.update_hooks(|hooks| hooks.on_submit = Some(handler));
    }

    pub fn set_failed_submit_handler<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handler: FailedSubmitHandler = Arc::new(handler);
        self.update_hooks(|hooks| hooks.on_failed_submit = Some(handler));
    }

    /// Replace the options. Values are untouched.
    pub fn set_options(&self, options: FormOptions) {
        let mut data = self.lock();
        data.options = options;
        data.runner.set_debounce(options.validate_debounce);
    }

    // ===== Observation =====

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.inner.events.subscribe()
    }

    /// Receive events affecting paths within `prefix`.
    pub fn watch(&self, prefix: &str) -> FieldWatch {
        FieldWatch::new(prefix, self.subscribe())
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Form").field(&self.snapshot()).finish()
    }
}

/// Clears `is_submitting` when a submit ends, however it ends.
struct SubmittingGuard<'a>(&'a Form);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().is_submitting = false;
        self.0.emit(FormEvent::SubmitFinished);
    }
}
