//! Experiment store and event log contracts with in-memory backends
//!
//! Persistence is owned by the enclosing service. The engine only sees the
//! narrow read/write contracts below; the `Memory*` types back tests and
//! embedded use.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::{EventRecord, EventType, ExperimentRecord};
use crate::Result;

/// Read access to experiment definitions.
pub trait ExperimentStore: Send + Sync {
    /// Get an experiment by ID.
    ///
    /// Returns `None` if the experiment doesn't exist.
    fn get(&self, experiment_id: &str) -> impl Future<Output = Result<Option<ExperimentRecord>>> + Send;
}

/// Append-only log of behavioral events.
///
/// Appends are durable once acknowledged and visible to every later read.
/// No ordering is guaranteed beyond that.
pub trait EventLog: Send + Sync {
    /// Append one event, returning the identity assigned to it.
    fn append(&self, event: EventRecord) -> impl Future<Output = Result<String>> + Send;

    /// List every event recorded for an experiment.
    fn list_all(&self, experiment_id: &str) -> impl Future<Output = Result<Vec<EventRecord>>> + Send;

    /// Most recent `assignment` event for the `(experiment, user)` pair.
    fn find_latest_assignment(
        &self,
        experiment_id: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<EventRecord>>> + Send;

    /// Append several events, returning their identities in input order.
    fn append_batch(
        &self,
        events: Vec<EventRecord>,
    ) -> impl Future<Output = Result<Vec<String>>> + Send {
        async move {
            let mut ids = Vec::with_capacity(events.len());
            for event in events {
                ids.push(self.append(event).await?);
            }
            Ok(ids)
        }
    }
}

/// In-memory experiment store using `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryExperimentStore {
    experiments: DashMap<String, ExperimentRecord>,
}

impl MemoryExperimentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an experiment.
    pub fn upsert(&self, experiment: ExperimentRecord) {
        self.experiments
            .insert(experiment.experiment_id().to_string(), experiment);
    }

    /// Apply a mutation (e.g. a lifecycle transition) in place.
    ///
    /// Returns `false` if the experiment doesn't exist.
    pub fn update<F>(&self, experiment_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut ExperimentRecord),
    {
        self.experiments
            .get_mut(experiment_id)
            .map(|mut entry| f(entry.value_mut()))
            .is_some()
    }

    /// Number of experiments in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

impl ExperimentStore for MemoryExperimentStore {
    async fn get(&self, experiment_id: &str) -> Result<Option<ExperimentRecord>> {
        Ok(self
            .experiments
            .get(experiment_id)
            .map(|entry| entry.value().clone()))
    }
}

/// In-memory event log, partitioned by experiment ID.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    partitions: DashMap<String, Vec<EventRecord>>,
    next_id: AtomicU64,
}

impl MemoryEventLog {
    /// Create a new empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events across all experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.value().len()).sum()
    }

    /// Check if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventLog for MemoryEventLog {
    async fn append(&self, event: EventRecord) -> Result<String> {
        let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let event = event.with_event_id(id.clone());
        self.partitions
            .entry(event.experiment_id().to_string())
            .or_default()
            .push(event);
        Ok(id)
    }

    async fn list_all(&self, experiment_id: &str) -> Result<Vec<EventRecord>> {
        Ok(self
            .partitions
            .get(experiment_id)
            .map(|p| p.value().clone())
            .unwrap_or_default())
    }

    async fn find_latest_assignment(
        &self,
        experiment_id: &str,
        user_id: &str,
    ) -> Result<Option<EventRecord>> {
        let Some(partition) = self.partitions.get(experiment_id) else {
            return Ok(None);
        };

        // max_by_key keeps the last of equal timestamps, i.e. the latest append
        Ok(partition
            .iter()
            .filter(|e| e.user_id() == user_id && e.event_type() == EventType::Assignment)
            .max_by_key(|e| e.timestamp())
            .cloned())
    }
}
