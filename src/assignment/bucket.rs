//! Frozen bucketing function (version 1)
//!
//! Input encoding: UTF-8 `"<experiment_id>-<user_id>"`, MD5 digest, first
//! 8 hex characters read as a big-endian `u32`, reduced `mod 100`, plus 1.
//! Changing any step silently reassigns existing users.

use md5::{Digest, Md5};

use crate::experiment::{Arm, TrafficAllocation};
use crate::Result;

/// Version tag of the bucketing scheme implemented here.
pub const BUCKETING_VERSION: u32 = 1;

/// Number of buckets; buckets are numbered `1..=BUCKET_COUNT`.
pub const BUCKET_COUNT: u32 = 100;

/// First 32 bits of the MD5 digest of `"<experiment_id>-<user_id>"`.
///
/// Equal to parsing the first 8 hex characters of the digest as a `u32`.
#[must_use]
pub fn hash_prefix(experiment_id: &str, user_id: &str) -> u32 {
    let digest = Md5::new()
        .chain_update(experiment_id.as_bytes())
        .chain_update(b"-")
        .chain_update(user_id.as_bytes())
        .finalize();

    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Bucket in `[1, 100]` for a user within an experiment.
///
/// # Examples
///
/// ```rust
/// use splitlab::assignment::bucket;
///
/// // md5("exp-1-user-1") starts with ea604fd8 = 3932180440
/// assert_eq!(bucket("exp-1", "user-1"), 41);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn bucket(experiment_id: &str, user_id: &str) -> u8 {
    // < 100 before the +1, so the cast is lossless
    (hash_prefix(experiment_id, user_id) % BUCKET_COUNT + 1) as u8
}

/// Arm owning `bucket` under `allocation`: buckets `1..=control` go to control.
#[must_use]
pub fn arm_for_bucket(bucket: u8, allocation: TrafficAllocation) -> Arm {
    if bucket <= allocation.control() {
        Arm::Control
    } else {
        Arm::Variant
    }
}

/// Deterministic arm for `(experiment_id, user_id, allocation)`.
///
/// Pure function: identical inputs always yield the identical arm.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidAllocation`] if `allocation` does not sum to 100.
pub fn hash_assign(experiment_id: &str, user_id: &str, allocation: TrafficAllocation) -> Result<Arm> {
    allocation.validate()?;
    Ok(arm_for_bucket(bucket(experiment_id, user_id), allocation))
}
