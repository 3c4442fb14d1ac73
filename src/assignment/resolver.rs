//! Assignment resolver: cache, prior assignment, then the frozen hash

use std::time::Duration;

use tracing::{debug, warn};

use super::hash_assign;
use crate::experiment::{Arm, EventLog, ExperimentStore};
use crate::kv::{assignment_key, KvStore};
use crate::Result;

/// Resolves the arm for a `(experiment, user)` pair.
///
/// Resolution order, each step returning on success:
/// 1. cached assignment
/// 2. `control` if the experiment is missing or not running (nothing cached)
/// 3. most recent persisted `assignment` event, then cached
/// 4. [`hash_assign`], then cached
///
/// Steps 1 and 3 only accelerate step 4, which is a pure function. The
/// resolver never appends events itself.
#[derive(Debug)]
pub struct AssignmentResolver<'a, X, L, C> {
    experiments: &'a X,
    events: &'a L,
    cache: &'a C,
    ttl: Duration,
}

impl<'a, X, L, C> AssignmentResolver<'a, X, L, C>
where
    X: ExperimentStore,
    L: EventLog,
    C: KvStore,
{
    /// Create a resolver over borrowed collaborators.
    #[must_use]
    pub const fn new(experiments: &'a X, events: &'a L, cache: &'a C, ttl: Duration) -> Self {
        Self {
            experiments,
            events,
            cache,
            ttl,
        }
    }

    /// Resolve the arm for `user_id` in `experiment_id`.
    ///
    /// # Errors
    ///
    /// Propagates experiment-store and event-log failures (retryable), and
    /// [`crate::Error::InvalidAllocation`] for a corrupt experiment. Cache
    /// failures are logged and bypassed.
    pub async fn resolve(&self, experiment_id: &str, user_id: &str) -> Result<Arm> {
        let key = assignment_key(experiment_id, user_id);

        if let Some(arm) = self.cached(&key).await {
            debug!(experiment_id, user_id, %arm, "assignment cache hit");
            return Ok(arm);
        }

        let experiment = match self.experiments.get(experiment_id).await? {
            Some(experiment) if experiment.is_running() => experiment,
            _ => {
                debug!(experiment_id, user_id, "experiment not running, falling back to control");
                return Ok(Arm::Control);
            }
        };

        if let Some(prior) = self
            .events
            .find_latest_assignment(experiment_id, user_id)
            .await?
        {
            let arm = prior.arm();
            debug!(experiment_id, user_id, %arm, "reusing persisted assignment");
            self.remember(&key, arm).await;
            return Ok(arm);
        }

        let arm = hash_assign(experiment_id, user_id, experiment.traffic_allocation())?;
        debug!(experiment_id, user_id, %arm, "assigned by hash");
        self.remember(&key, arm).await;
        Ok(arm)
    }

    async fn cached(&self, key: &str) -> Option<Arm> {
        let bytes = match self.cache.get(key).await {
            Ok(hit) => hit?,
            Err(e) => {
                warn!(key, error = %e, "assignment cache read failed, bypassing");
                return None;
            }
        };

        let parsed = std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse::<Arm>().ok());
        if parsed.is_none() {
            warn!(key, "ignoring malformed cached assignment");
        }
        parsed
    }

    async fn remember(&self, key: &str, arm: Arm) {
        if let Err(e) = self
            .cache
            .set(key, arm.as_str().as_bytes().to_vec(), self.ttl)
            .await
        {
            warn!(key, error = %e, "assignment cache write failed");
        }
    }
}
