//! Change notifications.
//!
//! Every mutating form operation publishes a [`FormEvent`]. A reactivity layer
//! can listen to all of them through [`Form::subscribe`](crate::Form::subscribe)
//! or only to those touching one part of the tree through a [`FieldWatch`].

use crate::path_is_within;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Something observable about a form changed.
///
/// Path-carrying variants hold the dotted path that was written, or `None`
/// when the whole map or tree was replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormEvent {
    Values { path: Option<String> },
    Errors { path: Option<String> },
    Touched { path: Option<String> },
    ValidationStarted { seq: u64 },
    ValidationFinished { seq: u64 },
    ValidationDiscarded { seq: u64 },
    ValidationFailed { seq: u64, error: String },
    SubmitStarted,
    SubmitFinished,
    Reset,
}

impl FormEvent {
    /// The written path, for path-carrying variants.
    pub fn path(&self) -> Option<&str> {
        match self {
            FormEvent::Values { path } | FormEvent::Errors { path } | FormEvent::Touched { path } => {
                path.as_deref()
            }
            _ => None,
        }
    }

    /// Whether a reader of paths within `prefix` may observe a difference.
    ///
    /// A write above the prefix replaces it and a write below changes part of
    /// it, so both count. Whole-form and status events affect every reader.
    pub fn affects(&self, prefix: &str) -> bool {
        match self.path() {
            Some(path) => path_is_within(path, prefix) || path_is_within(prefix, path),
            None => true,
        }
    }
}

/// Receiver filtered to events affecting one path prefix.
#[derive(Debug)]
pub struct FieldWatch {
    prefix: String,
    rx: broadcast::Receiver<FormEvent>,
}

impl FieldWatch {
    pub(crate) fn new(prefix: impl Into<String>, rx: broadcast::Receiver<FormEvent>) -> Self {
        Self {
            prefix: prefix.into(),
            rx,
        }
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Wait for the next relevant event. `None` once the form is dropped.
    pub async fn changed(&mut self) -> Option<FormEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.affects(&self.prefix) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(prefix = %self.prefix, skipped, "field watch lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(path: &str) -> FormEvent {
        FormEvent::Values {
            path: Some(path.to_string()),
        }
    }

    #[test]
    fn test_affects_same_ancestor_and_descendant() {
        assert!(values("friends.0.name").affects("friends.0.name"));
        assert!(values("friends").affects("friends.0.name"));
        assert!(values("friends.0.name").affects("friends"));
        assert!(!values("friendship").affects("friends"));
        assert!(!values("name").affects("surname"));
    }

    #[test]
    fn test_bulk_and_status_events_affect_everyone() {
        assert!(FormEvent::Errors { path: None }.affects("anything"));
        assert!(FormEvent::SubmitStarted.affects("name"));
        assert_eq!(FormEvent::Reset.path(), None);
    }

    #[tokio::test]
    async fn test_watch_filters_by_prefix() {
        let (tx, rx) = broadcast::channel(16);
        let mut watch = FieldWatch::new("preferences", rx);

        tx.send(values("name")).unwrap();
        tx.send(values("preferences.color")).unwrap();

        assert_eq!(watch.changed().await, Some(values("preferences.color")));

        drop(tx);
        assert_eq!(watch.changed().await, None);
    }
}
