//! Deterministic user → arm assignment
//!
//! [`bucket`] and [`hash_assign`] are the frozen, stateless core: a user's
//! arm is a pure function of `(experiment_id, user_id, allocation)`.
//! [`AssignmentResolver`] layers the cache and the persisted-assignment
//! lookup on top so a running experiment never moves a user between arms.

mod bucket;
mod resolver;

pub use bucket::{
    arm_for_bucket, bucket, hash_assign, hash_prefix, BUCKETING_VERSION, BUCKET_COUNT,
};
pub use resolver::AssignmentResolver;
