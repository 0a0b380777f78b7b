//! Debounce configuration for validation scheduling.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Wait used when debouncing is switched on without an explicit duration.
pub const DEFAULT_DEBOUNCE_WAIT: Duration = Duration::from_millis(300);

/// How validation requests are collapsed over time.
///
/// In configuration this reads from any of:
///
/// - `false`: disabled
/// - `true`: enabled with [`DEFAULT_DEBOUNCE_WAIT`], trailing edge
/// - a number: enabled with that many milliseconds, trailing edge (`0`
///   disables)
/// - `{"wait": ms, "leading": bool}`: either field may be omitted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Debounce {
    /// Every request runs right away.
    #[default]
    Disabled,
    /// Requests within `wait` of each other collapse into one run.
    ///
    /// With `leading`, the first request of a quiet period runs immediately
    /// and the rest of the burst collapses into one trailing run. Without it
    /// only the trailing run fires, `wait` after the last request.
    Enabled { wait: Duration, leading: bool },
}

impl Debounce {
    /// Trailing-edge debounce.
    pub fn trailing(wait: Duration) -> Self {
        Debounce::Enabled {
            wait,
            leading: false,
        }
    }

    /// Leading-edge debounce (with a trailing run for the rest of the burst).
    pub fn leading(wait: Duration) -> Self {
        Debounce::Enabled {
            wait,
            leading: true,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Debounce::Enabled { .. })
    }
}

impl From<bool> for Debounce {
    fn from(enabled: bool) -> Self {
        if enabled {
            Debounce::trailing(DEFAULT_DEBOUNCE_WAIT)
        } else {
            Debounce::Disabled
        }
    }
}

/// Zero milliseconds disables debouncing.
impl From<u64> for Debounce {
    fn from(wait_ms: u64) -> Self {
        Duration::from_millis(wait_ms).into()
    }
}

/// A zero duration disables debouncing.
impl From<Duration> for Debounce {
    fn from(wait: Duration) -> Self {
        if wait.is_zero() {
            Debounce::Disabled
        } else {
            Debounce::trailing(wait)
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DebounceRepr {
    Flag(bool),
    Millis(u64),
    Options {
        #[serde(default)]
        wait: Option<u64>,
        #[serde(default)]
        leading: Option<bool>,
    },
}

impl From<DebounceRepr> for Debounce {
    fn from(repr: DebounceRepr) -> Self {
        match repr {
            DebounceRepr::Flag(flag) => flag.into(),
            DebounceRepr::Millis(ms) => ms.into(),
            DebounceRepr::Options { wait, leading } => Debounce::Enabled {
                wait: wait.map_or(DEFAULT_DEBOUNCE_WAIT, Duration::from_millis),
                leading: leading.unwrap_or(false),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Debounce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DebounceRepr::deserialize(deserializer).map(Into::into)
    }
}

impl Serialize for Debounce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match *self {
            Debounce::Disabled => DebounceRepr::Flag(false),
            Debounce::Enabled { wait, leading } => DebounceRepr::Options {
                wait: Some(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)),
                leading: Some(leading),
            },
        };
        repr.serialize(serializer)
    }
}
