//! Debounce timing tests. They run on a paused clock, so every sleep below
//! advances virtual time deterministically.

use form_state::{validator_fn, Debounce, Form, FormConfig, FormOptions, HookError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// A form whose validator counts its invocations.
fn counting_form(debounce: Debounce) -> (Form, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let form = Form::new(
        FormConfig::new()
            .with_initial_values(json!({"name": ""}))
            .with_options(FormOptions::default().with_debounce(debounce))
            .with_validator(validator_fn(move |_: &Value| -> Result<Value, HookError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!({}))
            })),
    );
    (form, calls)
}

#[tokio::test(start_paused = true)]
async fn test_trailing_debounce_collapses_burst() {
    let (form, calls) = counting_form(Debounce::trailing(ms(50)));

    form.set_field_value("name", "a");
    sleep(ms(5)).await;
    form.set_field_value("name", "ab");
    sleep(ms(5)).await;
    form.set_field_value("name", "abc");
    assert!(form.is_validating());

    sleep(ms(40)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    sleep(ms(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!form.is_validating());
    assert_eq!(form.valid_values(), json!({"name": "abc"}));

    sleep(ms(500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_leading_debounce_fires_then_trails() {
    let (form, calls) = counting_form(Debounce::leading(ms(50)));

    form.set_field_value("name", "a");
    sleep(ms(5)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    form.set_field_value("name", "ab");
    sleep(ms(5)).await;
    form.set_field_value("name", "abc");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sleep(ms(60)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(form.valid_values(), json!({"name": "abc"}));
}

#[tokio::test(start_paused = true)]
async fn test_pending_run_uses_latest_validator() {
    let form = Form::new(
        FormConfig::new()
            .with_initial_values(json!({"name": ""}))
            .with_options(FormOptions::default().with_debounce(50u64))
            .with_validator(validator_fn(|_: &Value| -> Result<Value, HookError> {
                Ok(json!({"name": "from first"}))
            })),
    );

    form.set_field_value("name", "bill");
    form.set_validator(validator_fn(|_: &Value| -> Result<Value, HookError> {
        Ok(json!({"name": "from second"}))
    }));

    sleep(ms(100)).await;
    assert_eq!(form.get_field_error("name").as_deref(), Some("from second"));
}

#[tokio::test(start_paused = true)]
async fn test_validate_bypasses_debounce() {
    let (form, calls) = counting_form(Debounce::trailing(ms(50)));

    form.set_field_value("name", "a");
    form.validate().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The debounced run was superseded by the forced one.
    sleep(ms(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_values_are_not_revalidated() {
    let (form, calls) = counting_form(Debounce::Disabled);

    form.set_field_value("name", "a");
    sleep(ms(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    form.blur_field("name");
    sleep(ms(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!form.is_validating());
}

#[tokio::test(start_paused = true)]
async fn test_validate_on_change_disabled() {
    let (form, calls) = counting_form(Debounce::Disabled);
    form.set_options(FormOptions::default().with_validate_on_change(false));

    form.set_field_value("name", "a");
    sleep(ms(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!form.is_validating());
}
