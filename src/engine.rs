//! Experiment engine: the two read operations plus the invalidating write path
//!
//! Cache policy:
//! - results: `results:<experiment>`, TTL 60 s, full [`ExperimentResults`] as JSON
//! - assignments: `assignment:<experiment>:<user>`, TTL 1 h
//! - every event append deletes the experiment's results entry before the
//!   write is acknowledged; assignment entries only expire
//!
//! No single-flight: concurrent misses recompute independently and converge,
//! since aggregation and statistics are pure over the same history.

use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assignment::AssignmentResolver;
use crate::config::EngineConfig;
use crate::experiment::{Arm, EventLog, EventRecord, ExperimentStore};
use crate::kv::{results_key, KvStore};
use crate::results::{self, ExperimentResults};
use crate::{Error, Result};

/// Outcome of [`ExperimentEngine::track_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Events appended to the log.
    pub processed: usize,
    /// Events dropped because their experiment is missing or not running.
    pub skipped: usize,
}

/// Assignment and results engine over injected collaborators.
///
/// Holds no global state; every backend is owned by the engine and
/// reachable through accessors for inspection.
///
/// # Example
///
/// ```rust
/// use splitlab::experiment::{ExperimentRecord, MemoryEventLog, MemoryExperimentStore};
/// use splitlab::kv::MemoryKvStore;
/// use splitlab::ExperimentEngine;
///
/// # async fn example() -> splitlab::Result<()> {
/// let store = MemoryExperimentStore::new();
/// let mut experiment = ExperimentRecord::new("exp-1", "Pricing page");
/// experiment.start();
/// store.upsert(experiment);
///
/// let engine = ExperimentEngine::builder(store, MemoryEventLog::new(), MemoryKvStore::new())
///     .results_ttl_secs(30)
///     .build();
///
/// let arm = engine.assign("exp-1", "user-42").await?;
/// let results = engine.compute_results("exp-1").await?;
/// assert_eq!(results.control.visitors + results.variant.visitors, 1);
/// # let _ = arm;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExperimentEngine<X, L, C> {
    experiments: X,
    events: L,
    cache: C,
    config: EngineConfig,
}

impl<X, L, C> ExperimentEngine<X, L, C>
where
    X: ExperimentStore,
    L: EventLog,
    C: KvStore,
{
    /// Create a new engine builder
    #[must_use]
    pub fn builder(experiments: X, events: L, cache: C) -> EngineBuilder<X, L, C> {
        EngineBuilder::new(experiments, events, cache)
    }

    /// Experiment store backing the engine.
    #[must_use]
    pub const fn experiments(&self) -> &X {
        &self.experiments
    }

    /// Event log backing the engine.
    #[must_use]
    pub const fn events(&self) -> &L {
        &self.events
    }

    /// Cache backing the engine.
    #[must_use]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Active cache policy.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the arm for a user without recording anything.
    ///
    /// Missing or non-running experiments resolve to [`Arm::Control`].
    ///
    /// # Errors
    ///
    /// Propagates experiment-store and event-log failures (retryable).
    /// Cache failures never surface.
    pub async fn resolve_variant(&self, experiment_id: &str, user_id: &str) -> Result<Arm> {
        AssignmentResolver::new(
            &self.experiments,
            &self.events,
            &self.cache,
            self.config.assignment_ttl,
        )
        .resolve(experiment_id, user_id)
        .await
    }

    /// Resolve the arm and record the exposure as an `assignment` event.
    ///
    /// Non-running experiments return [`Arm::Control`] and write nothing.
    ///
    /// # Errors
    ///
    /// Propagates experiment-store and event-log failures (retryable).
    pub async fn assign(&self, experiment_id: &str, user_id: &str) -> Result<Arm> {
        require_non_empty("user_id", user_id)?;
        if !self.is_running(experiment_id).await? {
            debug!(experiment_id, user_id, "assign on inactive experiment, not recording");
            return Ok(Arm::Control);
        }

        let arm = self.resolve_variant(experiment_id, user_id).await?;
        self.events
            .append(EventRecord::assignment(experiment_id, user_id, arm))
            .await?;
        self.invalidate_results(experiment_id).await;

        info!(experiment_id, user_id, %arm, "assignment recorded");
        Ok(arm)
    }

    /// Compute results for an experiment, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Propagates event-log failures (retryable). Cache failures and
    /// undecodable cache entries fall back to recomputation.
    pub async fn compute_results(&self, experiment_id: &str) -> Result<ExperimentResults> {
        let key = results_key(experiment_id);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) => match ExperimentResults::from_cache_bytes(&bytes) {
                Ok(cached) => {
                    debug!(experiment_id, "results cache hit");
                    return Ok(cached);
                }
                Err(e) => warn!(experiment_id, error = %e, "discarding undecodable cached results"),
            },
            Ok(None) => debug!(experiment_id, "results cache miss"),
            Err(e) => warn!(experiment_id, error = %e, "results cache read failed, recomputing"),
        }

        let computed = results::compute(&self.events, experiment_id).await?;

        match computed.to_cache_bytes() {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(&key, bytes, self.config.results_ttl).await {
                    warn!(experiment_id, error = %e, "results cache write failed");
                }
            }
            Err(e) => warn!(experiment_id, error = %e, "results not cacheable"),
        }

        Ok(computed)
    }

    /// Append one event and invalidate the experiment's cached results.
    ///
    /// Returns the identity assigned by the event log.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty experiment or user ID
    /// - [`Error::ExperimentNotFound`] if the experiment is missing or not running
    /// - store/log failures (retryable)
    pub async fn track(&self, event: EventRecord) -> Result<String> {
        validate_event(&event)?;
        let experiment_id = event.experiment_id().to_string();
        if !self.is_running(&experiment_id).await? {
            return Err(Error::ExperimentNotFound(experiment_id));
        }

        let event_id = self.events.append(event).await?;
        self.invalidate_results(&experiment_id).await;

        info!(%experiment_id, %event_id, "event tracked");
        Ok(event_id)
    }

    /// Append many events, skipping those for inactive experiments.
    ///
    /// Results caches are invalidated for every experiment that received events.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if any event has an empty experiment or user ID
    /// - [`Error::NoValidEvents`] if nothing is left after skipping
    /// - store/log failures (retryable)
    pub async fn track_batch(&self, events: Vec<EventRecord>) -> Result<BatchReceipt> {
        for event in &events {
            validate_event(event)?;
        }

        let mut running: FxHashMap<String, bool> = FxHashMap::default();
        for event in &events {
            let experiment_id = event.experiment_id();
            if !running.contains_key(experiment_id) {
                let active = self.is_running(experiment_id).await?;
                running.insert(experiment_id.to_string(), active);
            }
        }

        let total = events.len();
        let accepted: Vec<EventRecord> = events
            .into_iter()
            .filter(|e| running.get(e.experiment_id()).copied().unwrap_or(false))
            .collect();

        if accepted.is_empty() {
            return Err(Error::NoValidEvents);
        }

        let touched: FxHashSet<String> = accepted
            .iter()
            .map(|e| e.experiment_id().to_string())
            .collect();

        let processed = accepted.len();
        self.events.append_batch(accepted).await?;
        for experiment_id in &touched {
            self.invalidate_results(experiment_id).await;
        }

        let receipt = BatchReceipt {
            processed,
            skipped: total - processed,
        };
        info!(
            processed = receipt.processed,
            skipped = receipt.skipped,
            experiments = touched.len(),
            "event batch tracked"
        );
        Ok(receipt)
    }

    /// Drop the cached results for an experiment.
    ///
    /// A failing cache is logged, not propagated: the event is already durable.
    pub async fn invalidate_results(&self, experiment_id: &str) {
        if let Err(e) = self.cache.delete(&results_key(experiment_id)).await {
            warn!(experiment_id, error = %e, "results cache invalidation failed");
        }
    }

    async fn is_running(&self, experiment_id: &str) -> Result<bool> {
        Ok(self
            .experiments
            .get(experiment_id)
            .await?
            .is_some_and(|experiment| experiment.is_running()))
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::InvalidInput(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

fn validate_event(event: &EventRecord) -> Result<()> {
    require_non_empty("experiment_id", event.experiment_id())?;
    require_non_empty("user_id", event.user_id())
}

/// Builder for [`ExperimentEngine`].
#[derive(Debug)]
pub struct EngineBuilder<X, L, C> {
    experiments: X,
    events: L,
    cache: C,
    config: EngineConfig,
}

impl<X, L, C> EngineBuilder<X, L, C>
where
    X: ExperimentStore,
    L: EventLog,
    C: KvStore,
{
    /// Create a builder with the default cache policy.
    #[must_use]
    pub fn new(experiments: X, events: L, cache: C) -> Self {
        Self {
            experiments,
            events,
            cache,
            config: EngineConfig::default(),
        }
    }

    /// Replace the whole cache policy.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the results TTL in seconds.
    #[must_use]
    pub fn results_ttl_secs(mut self, secs: u64) -> Self {
        self.config.results_ttl = Duration::from_secs(secs);
        self
    }

    /// Set the assignment TTL in seconds.
    #[must_use]
    pub fn assignment_ttl_secs(mut self, secs: u64) -> Self {
        self.config.assignment_ttl = Duration::from_secs(secs);
        self
    }

    /// Build the engine
    #[must_use]
    pub fn build(self) -> ExperimentEngine<X, L, C> {
        ExperimentEngine {
            experiments: self.experiments,
            events: self.events,
            cache: self.cache,
            config: self.config,
        }
    }
}
