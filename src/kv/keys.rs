//! Cache key layout shared by the engine and any external cache.

/// Key for an experiment's memoized results: `results:<experiment_id>`.
#[must_use]
pub fn results_key(experiment_id: &str) -> String {
    format!("results:{experiment_id}")
}

/// Key for a memoized assignment: `assignment:<experiment_id>:<user_id>`.
#[must_use]
pub fn assignment_key(experiment_id: &str, user_id: &str) -> String {
    format!("assignment:{experiment_id}:{user_id}")
}
