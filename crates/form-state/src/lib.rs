//! Reactive form state: path-addressed values, field errors and touched flags,
//! kept consistent under concurrent edits and asynchronous validation.
//!
//! # Core Concepts
//!
//! - **Path**: dotted address into the value tree (`"friends.0.name"`); an
//!   all-digit segment is a sequence index
//! - **Codec**: fail-closed reads and container-creating writes on
//!   `serde_json::Value`, with empty containers pruned after deletes
//! - **FieldError**: absent, one message, or a list of messages, stored in a
//!   flat map keyed by path
//! - **ValidationRunner**: debounce plus sequence-numbered staleness
//!   discarding, so an old validation never overwrites a newer one
//! - **Form**: the aggregate tying values, errors, touched flags and the
//!   validator/submit collaborators together
//!
//! # Quick Start
//!
//! ```
//! use form_state::{validator_fn, Form, FormConfig, HookError, SubmitOutcome};
//! use serde_json::{json, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let form = Form::new(
//!     FormConfig::new()
//!         .with_initial_values(json!({"name": ""}))
//!         .with_validator(validator_fn(|values: &Value| -> Result<Value, HookError> {
//!             Ok(if values["name"] == "" {
//!                 json!({"name": "Required"})
//!             } else {
//!                 json!({})
//!             })
//!         })),
//! );
//!
//! assert_eq!(form.submit().await.unwrap(), SubmitOutcome::Invalid);
//! assert_eq!(form.get_field_error("name").as_deref(), Some("Required"));
//! assert!(form.is_field_touched("name"));
//!
//! form.set_field_value("name", "bill");
//! assert_eq!(form.submit().await.unwrap(), SubmitOutcome::Submitted);
//! assert_eq!(form.submitted_values(), Some(json!({"name": "bill"})));
//! # }
//! ```

mod codec;
mod config;
mod debounce;
mod error;
mod events;
mod field_error;
mod form;
mod path;
mod submit;
mod validation;
mod validator;

// Paths and tree access
pub use codec::{
    assign_at_path, build_path_map, delete_at_path, get_at_path, set_at_path, MAX_SEQUENCE_INDEX,
};
pub use path::{parse_path, path_is_within, Path, Seg};

// Errors
pub use error::{FormError, FormResult, HookError};
pub use field_error::{
    flatten_errors, has_errors, is_error, merge_error_maps, merge_field_errors, ErrorMap,
    FieldError, TouchedMap, ValidationOutput,
};

// Validation
pub use debounce::{Debounce, DEFAULT_DEBOUNCE_WAIT};
pub use validation::{Schedule, Ticket, ValidationRunner};
pub use validator::{
    async_validator_fn, compose_validators, field_validator_fn, validator_fn, AsyncValidatorFn,
    ComposedValidator, FieldValidate, FieldValidatorFn, Validate, ValidatorFn,
};

// Form
pub use config::{FailedSubmitHandler, FormConfig, FormOptions, InitialValues};
pub use events::{FieldWatch, FormEvent};
pub use form::{Form, FormSnapshot};
pub use submit::{submit_fn, SubmitFn, SubmitHandler, SubmitOutcome};

// Re-export serde_json::Value for convenience
pub use serde_json::Value;
