//! # Splitlab: Two-Arm Experiment Assignment and Analysis
//!
//! Splitlab assigns users of a running experiment to `control` or `variant`
//! and decides whether the observed conversion-rate difference between the
//! arms is statistically significant.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke**: Assignment is a frozen pure function; caches can never move a user
//! - **Jidoka**: Allocation invariants are checked, never silently normalized
//! - **Muda elimination**: Short-lived memoization in front of full-history recomputation
//! - **Genchi Genbutsu**: Counts are distinct users, not raw event volume
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use splitlab::experiment::{Arm, EventRecord, ExperimentRecord};
//! use splitlab::experiment::{MemoryEventLog, MemoryExperimentStore};
//! use splitlab::kv::MemoryKvStore;
//! use splitlab::ExperimentEngine;
//!
//! # async fn example() -> splitlab::Result<()> {
//! let store = MemoryExperimentStore::new();
//! let mut experiment = ExperimentRecord::new("exp-1", "Checkout copy");
//! experiment.start();
//! store.upsert(experiment);
//!
//! let engine = ExperimentEngine::builder(store, MemoryEventLog::new(), MemoryKvStore::new()).build();
//!
//! // "Get my arm": resolve and record the exposure
//! let arm = engine.assign("exp-1", "user-42").await?;
//!
//! // The client later reports a conversion for that arm
//! engine.track(EventRecord::conversion("exp-1", "user-42", arm)).await?;
//!
//! let results = engine.compute_results("exp-1").await?;
//! println!("p = {:.4}, significant = {}", results.p_value, results.statistical_significance);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod assignment;
pub mod config;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod kv;
pub mod logging;
pub mod results;
pub mod stats;

pub use config::EngineConfig;
pub use engine::{BatchReceipt, EngineBuilder, ExperimentEngine};
pub use error::{Error, Result};
pub use experiment::Arm;
pub use results::ExperimentResults;
