//! Experiment Record - root entity for a two-arm controlled experiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lifecycle status of an experiment.
///
/// Only [`ExperimentStatus::Running`] experiments receive new assignments
/// or accept tracked events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    /// Created but not yet started.
    Draft,
    /// Live: users are bucketed and events are accepted.
    Running,
    /// Paused or halted before a conclusion was reached.
    Stopped,
    /// Concluded.
    Completed,
}

/// Percentage split of traffic between the two arms.
///
/// Invariant: `control + variant == 100`. Construction and deserialization
/// both reject other splits instead of normalizing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AllocationShares")]
pub struct TrafficAllocation {
    control: u8,
    variant: u8,
}

#[derive(Deserialize)]
struct AllocationShares {
    control: u8,
    variant: u8,
}

impl TryFrom<AllocationShares> for TrafficAllocation {
    type Error = Error;

    fn try_from(shares: AllocationShares) -> Result<Self> {
        Self::new(shares.control, shares.variant)
    }
}

impl TrafficAllocation {
    /// Create a validated allocation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAllocation`] unless the shares sum to exactly 100.
    pub fn new(control: u8, variant: u8) -> Result<Self> {
        let allocation = Self { control, variant };
        allocation.validate()?;
        Ok(allocation)
    }

    /// Re-check the sum invariant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAllocation`] if the shares do not sum to 100.
    pub fn validate(&self) -> Result<()> {
        if u16::from(self.control) + u16::from(self.variant) == 100 {
            Ok(())
        } else {
            Err(Error::InvalidAllocation {
                control: self.control,
                variant: self.variant,
            })
        }
    }

    /// Control share in percent.
    #[must_use]
    pub const fn control(&self) -> u8 {
        self.control
    }

    /// Variant share in percent.
    #[must_use]
    pub const fn variant(&self) -> u8 {
        self.variant
    }
}

impl Default for TrafficAllocation {
    fn default() -> Self {
        Self {
            control: 50,
            variant: 50,
        }
    }
}

/// Experiment Record represents a two-arm experiment definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    experiment_id: String,
    name: String,
    description: Option<String>,
    status: ExperimentStatus,
    traffic_allocation: TrafficAllocation,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl ExperimentRecord {
    /// Create a new draft experiment with a 50/50 split.
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - Unique identifier for the experiment
    /// * `name` - Human-readable name for the experiment
    #[must_use]
    pub fn new(experiment_id: impl Into<String>, name: impl Into<String>) -> Self {
        ExperimentRecordBuilder::new(experiment_id, name).build()
    }

    /// Create a builder for constructing an experiment record with optional fields.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
    ) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(experiment_id, name)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Whether the experiment is eligible for new assignments.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == ExperimentStatus::Running
    }

    /// Get the traffic allocation.
    #[must_use]
    pub const fn traffic_allocation(&self) -> TrafficAllocation {
        self.traffic_allocation
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the start timestamp, if the experiment was started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the stop timestamp, if the experiment was stopped or completed.
    #[must_use]
    pub const fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.stopped_at
    }

    /// Get the last modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Start the experiment, transitioning to Running.
    ///
    /// `started_at` is set on the first start only; restarting a stopped
    /// experiment keeps the original start time.
    pub fn start(&mut self) {
        let now = Utc::now();
        self.status = ExperimentStatus::Running;
        self.started_at.get_or_insert(now);
        self.stopped_at = None;
        self.updated_at = now;
    }

    /// Stop the experiment without concluding it.
    pub fn stop(&mut self) {
        self.finish(ExperimentStatus::Stopped);
    }

    /// Mark the experiment as concluded.
    pub fn complete(&mut self) {
        self.finish(ExperimentStatus::Completed);
    }

    fn finish(&mut self, status: ExperimentStatus) {
        let now = Utc::now();
        self.status = status;
        self.stopped_at = Some(now);
        self.updated_at = now;
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    experiment_id: String,
    name: String,
    description: Option<String>,
    status: ExperimentStatus,
    traffic_allocation: TrafficAllocation,
    created_at: DateTime<Utc>,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            description: None,
            status: ExperimentStatus::Draft,
            traffic_allocation: TrafficAllocation::default(),
            created_at: Utc::now(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the initial status (useful for fixtures and deserialized state).
    #[must_use]
    pub const fn status(mut self, status: ExperimentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the traffic allocation.
    #[must_use]
    pub const fn traffic_allocation(mut self, allocation: TrafficAllocation) -> Self {
        self.traffic_allocation = allocation;
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        let started_at = (self.status != ExperimentStatus::Draft).then_some(self.created_at);
        let stopped_at = matches!(
            self.status,
            ExperimentStatus::Stopped | ExperimentStatus::Completed
        )
        .then_some(self.created_at);

        ExperimentRecord {
            experiment_id: self.experiment_id,
            name: self.name,
            description: self.description,
            status: self.status,
            traffic_allocation: self.traffic_allocation,
            created_at: self.created_at,
            started_at,
            stopped_at,
            updated_at: self.created_at,
        }
    }
}
