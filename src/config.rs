//! Engine configuration
//!
//! Cache lifetimes only. Statistical constants are fixed in [`crate::stats`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default lifetime of memoized experiment results (60 s).
pub const DEFAULT_RESULTS_TTL: Duration = Duration::from_secs(60);

/// Default lifetime of memoized assignments (1 h).
pub const DEFAULT_ASSIGNMENT_TTL: Duration = Duration::from_secs(3600);

/// Cache policy for [`crate::ExperimentEngine`].
///
/// Serialized with whole seconds, e.g. `{"results_ttl": 60, "assignment_ttl": 3600}`.
/// Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long computed results stay cached.
    #[serde(with = "duration_secs")]
    pub results_ttl: Duration,
    /// How long resolved assignments stay cached.
    #[serde(with = "duration_secs")]
    pub assignment_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            results_ttl: DEFAULT_RESULTS_TTL,
            assignment_ttl: DEFAULT_ASSIGNMENT_TTL,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
