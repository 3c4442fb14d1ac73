//! Reduction of an event history into deduplicated per-arm counts

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::experiment::{Arm, EventRecord, EventType};

/// Distinct-user counts per arm.
///
/// A user contributes at most one visitor and one conversion credit per
/// arm, however many matching events exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmCounts {
    /// Distinct users with an `assignment` event in control.
    pub control_visitors: u64,
    /// Distinct users with an `assignment` event in variant.
    pub variant_visitors: u64,
    /// Distinct users with a `conversion` event in control.
    pub control_conversions: u64,
    /// Distinct users with a `conversion` event in variant.
    pub variant_conversions: u64,
}

#[derive(Default)]
struct UserSets<'a> {
    control_visitors: FxHashSet<&'a str>,
    variant_visitors: FxHashSet<&'a str>,
    control_conversions: FxHashSet<&'a str>,
    variant_conversions: FxHashSet<&'a str>,
}

/// Reduce events to per-arm distinct-user counts.
///
/// `pageview` and `custom` events are ignored. Input order is irrelevant
/// and the reduction has no side effects, so repeated calls over the same
/// history agree.
///
/// # Examples
///
/// ```rust
/// use splitlab::experiment::{Arm, EventRecord};
/// use splitlab::results::aggregate;
///
/// let events = vec![
///     EventRecord::assignment("exp-1", "alice", Arm::Variant),
///     EventRecord::conversion("exp-1", "alice", Arm::Variant),
///     EventRecord::conversion("exp-1", "alice", Arm::Variant),
/// ];
/// let counts = aggregate(&events);
/// assert_eq!(counts.variant_visitors, 1);
/// assert_eq!(counts.variant_conversions, 1);
/// ```
#[must_use]
pub fn aggregate(events: &[EventRecord]) -> ArmCounts {
    let mut sets = UserSets::default();

    for event in events {
        let set = match (event.event_type(), event.arm()) {
            (EventType::Assignment, Arm::Control) => &mut sets.control_visitors,
            (EventType::Assignment, Arm::Variant) => &mut sets.variant_visitors,
            (EventType::Conversion, Arm::Control) => &mut sets.control_conversions,
            (EventType::Conversion, Arm::Variant) => &mut sets.variant_conversions,
            (EventType::Pageview | EventType::Custom, _) => continue,
        };
        set.insert(event.user_id());
    }

    ArmCounts {
        control_visitors: sets.control_visitors.len() as u64,
        variant_visitors: sets.variant_visitors.len() as u64,
        control_conversions: sets.control_conversions.len() as u64,
        variant_conversions: sets.variant_conversions.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        assert_eq!(aggregate(&[]), ArmCounts::default());
    }

    #[test]
    fn test_duplicate_conversions_count_once() {
        let events = vec![
            EventRecord::assignment("exp-1", "u1", Arm::Control),
            EventRecord::conversion("exp-1", "u1", Arm::Control),
            EventRecord::conversion("exp-1", "u1", Arm::Control),
        ];
        let counts = aggregate(&events);
        assert_eq!(counts.control_visitors, 1);
        assert_eq!(counts.control_conversions, 1);
    }

    #[test]
    fn test_pageview_and_custom_are_ignored() {
        let events = vec![
            EventRecord::new("exp-1", "u1", EventType::Pageview, Arm::Control),
            EventRecord::new("exp-1", "u2", EventType::Custom, Arm::Variant),
        ];
        assert_eq!(aggregate(&events), ArmCounts::default());
    }

    #[test]
    fn test_user_credited_per_arm() {
        // Same user appearing in both arms is credited once in each
        let events = vec![
            EventRecord::assignment("exp-1", "u1", Arm::Control),
            EventRecord::assignment("exp-1", "u1", Arm::Variant),
            EventRecord::assignment("exp-1", "u2", Arm::Variant),
            EventRecord::conversion("exp-1", "u2", Arm::Variant),
        ];
        let counts = aggregate(&events);
        assert_eq!(
            counts,
            ArmCounts {
                control_visitors: 1,
                variant_visitors: 2,
                control_conversions: 0,
                variant_conversions: 1,
            }
        );
    }

    #[test]
    fn test_conversion_without_assignment_still_counts() {
        let events = vec![EventRecord::conversion("exp-1", "u9", Arm::Variant)];
        let counts = aggregate(&events);
        assert_eq!(counts.variant_conversions, 1);
        assert_eq!(counts.variant_visitors, 0);
    }
}
