//! Results computation: event history → counts → statistics
//!
//! Aggregation re-reads the full history on every call. Cost is
//! `O(events in experiment)`; the engine's short-lived results cache is the
//! only mitigation.

mod aggregate;
mod report;

pub use aggregate::{aggregate, ArmCounts};
pub use report::{ExperimentResults, VariantResults};

use crate::experiment::EventLog;
use crate::Result;

/// Read an experiment's full history and reduce it to [`ArmCounts`].
///
/// # Errors
///
/// Propagates event-log failures (retryable).
pub async fn aggregate_experiment<L: EventLog>(events: &L, experiment_id: &str) -> Result<ArmCounts> {
    let history = events.list_all(experiment_id).await?;
    Ok(aggregate(&history))
}

/// Aggregate and run the significance engine, bypassing any cache.
///
/// # Errors
///
/// Propagates event-log failures (retryable).
pub async fn compute<L: EventLog>(events: &L, experiment_id: &str) -> Result<ExperimentResults> {
    let counts = aggregate_experiment(events, experiment_id).await?;
    Ok(ExperimentResults::from_counts(experiment_id, counts))
}
