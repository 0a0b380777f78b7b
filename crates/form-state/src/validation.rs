//! Validation scheduling: debounce and staleness discarding.
//!
//! [`ValidationRunner`] is a plain state machine owned by the form aggregate.
//! Every scheduling event issues a [`Ticket`] carrying the next sequence
//! number. A run may apply its result only if its ticket is still the most
//! recently issued one when it completes; anything older is ignored. That is
//! the only cancellation mechanism: superseded runs are never interrupted.

use crate::{
    get_at_path, merge_error_maps, parse_path, Debounce, ErrorMap, FieldValidate, HookError,
    Validate,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Sequence number issued for one validation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    #[inline]
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// When a scheduled validation should run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Run now.
    Immediate(Ticket),
    /// Run after `wait`, and only if `ticket` is still current by then.
    Deferred { ticket: Ticket, wait: Duration },
}

impl Schedule {
    #[inline]
    pub fn ticket(&self) -> Ticket {
        match self {
            Schedule::Immediate(ticket) | Schedule::Deferred { ticket, .. } => *ticket,
        }
    }
}

/// Sequence counter, debounce window and the `is_validating` flag.
#[derive(Debug, Default)]
pub struct ValidationRunner {
    debounce: Debounce,
    issued: u64,
    validating: bool,
    window_until: Option<Instant>,
}

impl ValidationRunner {
    pub fn new(debounce: Debounce) -> Self {
        Self {
            debounce,
            ..Default::default()
        }
    }

    #[inline]
    pub fn debounce(&self) -> Debounce {
        self.debounce
    }

    pub fn set_debounce(&mut self, debounce: Debounce) {
        self.debounce = debounce;
        self.window_until = None;
    }

    fn issue(&mut self) -> Ticket {
        self.issued += 1;
        self.validating = true;
        Ticket(self.issued)
    }

    /// Schedule a validation request arriving at `now`, honouring debounce.
    pub fn schedule(&mut self, now: Instant) -> Schedule {
        let ticket = self.issue();
        match self.debounce {
            Debounce::Disabled => Schedule::Immediate(ticket),
            Debounce::Enabled { wait, leading } => {
                let quiet = self.window_until.map_or(true, |until| now >= until);
                self.window_until = Some(now + wait);
                if leading && quiet {
                    Schedule::Immediate(ticket)
                } else {
                    Schedule::Deferred { ticket, wait }
                }
            }
        }
    }

    /// Issue a ticket that bypasses debounce and supersedes anything pending.
    pub fn force(&mut self) -> Ticket {
        self.issue()
    }

    /// Whether `ticket` is the most recently issued one.
    #[inline]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Mark the run for `ticket` as finished.
    ///
    /// Returns `false`, leaving state untouched, for a stale ticket.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.validating = false;
        true
    }

    /// Supersede every issued ticket without scheduling a new run.
    pub fn invalidate(&mut self) {
        self.issued += 1;
        self.validating = false;
        self.window_until = None;
    }

    #[inline]
    pub fn is_validating(&self) -> bool {
        self.validating
    }

    #[inline]
    pub fn latest_seq(&self) -> u64 {
        self.issued
    }
}

/// Run the form validator and every field validator against `values`.
///
/// Form-level errors come first in the merge, field-level errors are appended
/// in path order. The first raised failure aborts the pass.
pub(crate) async fn run_validation_pass(
    validator: Option<Arc<dyn Validate>>,
    field_validators: Vec<(String, Arc<dyn FieldValidate>)>,
    values: &Value,
) -> Result<ErrorMap, HookError> {
    let form_errors = match validator {
        Some(validator) => validator.validate(values).await?.into_error_map(),
        None => ErrorMap::new(),
    };

    let field_errors = futures::future::try_join_all(field_validators.iter().map(
        |(path, validator)| async move {
            let value = get_at_path(values, &parse_path(path));
            let error = validator.validate_field(value, values).await?;
            Ok::<_, HookError>(error.map(|e| ErrorMap::from([(path.clone(), e)])))
        },
    ))
    .await?;

    Ok(merge_error_maps(
        std::iter::once(form_errors).chain(field_errors.into_iter().flatten()),
    ))
}
