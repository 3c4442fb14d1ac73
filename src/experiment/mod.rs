//! Experiment and event schema
//!
//! This module provides the data structures shared by assignment and
//! results computation, plus the collaborator contracts used to read them.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< EventRecord (N)
//!   status, traffic_allocation      user_id, event_type, arm
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use splitlab::experiment::{Arm, EventRecord, ExperimentRecord, TrafficAllocation};
//!
//! // Define a 70/30 experiment and start it
//! let mut experiment = ExperimentRecord::builder("exp-001", "Checkout copy")
//!     .traffic_allocation(TrafficAllocation::new(70, 30)?)
//!     .build();
//! experiment.start();
//!
//! // A user saw the variant and converted
//! let exposure = EventRecord::assignment(experiment.experiment_id(), "user-42", Arm::Variant);
//! let conversion = EventRecord::conversion(experiment.experiment_id(), "user-42", Arm::Variant);
//! # let _ = (exposure, conversion);
//! # Ok::<(), splitlab::Error>(())
//! ```

mod event_record;
mod experiment_record;
mod store;

pub use event_record::{Arm, EventRecord, EventRecordBuilder, EventType};
pub use experiment_record::{
    ExperimentRecord, ExperimentRecordBuilder, ExperimentStatus, TrafficAllocation,
};
pub use store::{EventLog, ExperimentStore, MemoryEventLog, MemoryExperimentStore};
