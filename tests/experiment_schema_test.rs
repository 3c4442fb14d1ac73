//! Experiment and event schema tests
//!
//! Covers the public record types, their wire format, and the in-memory
//! collaborator backends.

use chrono::{Duration, TimeZone, Utc};
use splitlab::experiment::{
    Arm, EventLog, EventRecord, EventType, ExperimentRecord, ExperimentStatus, ExperimentStore,
    MemoryEventLog, MemoryExperimentStore, TrafficAllocation,
};
use splitlab::Error;

// =============================================================================
// ExperimentRecord Tests
// =============================================================================

#[test]
fn test_experiment_record_creation() {
    let record = ExperimentRecord::new("exp-001", "My Experiment");

    assert_eq!(record.experiment_id(), "exp-001");
    assert_eq!(record.name(), "My Experiment");
    assert_eq!(record.status(), ExperimentStatus::Draft);
    assert!(record.created_at().timestamp() > 0);
    assert!(record.description().is_none());
    assert!(record.started_at().is_none());
    assert!(record.stopped_at().is_none());
}

#[test]
fn test_experiment_record_builder() {
    let allocation = TrafficAllocation::new(80, 20).unwrap();
    let record = ExperimentRecord::builder("exp-002", "Pricing")
        .description("Annual plan discount banner")
        .traffic_allocation(allocation)
        .status(ExperimentStatus::Running)
        .build();

    assert_eq!(record.description(), Some("Annual plan discount banner"));
    assert_eq!(record.traffic_allocation().control(), 80);
    assert_eq!(record.traffic_allocation().variant(), 20);
    assert!(record.is_running());
    assert_eq!(record.started_at(), Some(record.created_at()));
}

#[test]
fn test_experiment_record_serialization() {
    let mut record = ExperimentRecord::new("exp-003", "Serialization Test");
    record.start();

    let json = serde_json::to_string(&record).expect("serialization failed");
    assert!(json.contains("\"status\":\"running\""));
    assert!(json.contains("\"traffic_allocation\":{\"control\":50,\"variant\":50}"));

    let deserialized: ExperimentRecord =
        serde_json::from_str(&json).expect("deserialization failed");
    assert_eq!(record, deserialized);
}

#[test]
fn test_experiment_record_rejects_corrupt_allocation() {
    let mut value = serde_json::to_value(ExperimentRecord::new("exp-004", "Corrupt")).unwrap();
    value["traffic_allocation"] = serde_json::json!({"control": 70, "variant": 70});

    let err = serde_json::from_value::<ExperimentRecord>(value).unwrap_err();
    assert!(err.to_string().contains("Invalid traffic allocation"));
}

#[test]
fn test_experiment_status_variants() {
    for (status, wire) in [
        (ExperimentStatus::Draft, "\"draft\""),
        (ExperimentStatus::Running, "\"running\""),
        (ExperimentStatus::Stopped, "\"stopped\""),
        (ExperimentStatus::Completed, "\"completed\""),
    ] {
        assert_eq!(serde_json::to_string(&status).unwrap(), wire);
    }
}

#[test]
fn test_traffic_allocation_invariant() {
    assert!(TrafficAllocation::new(0, 100).is_ok());
    assert!(matches!(
        TrafficAllocation::new(0, 0),
        Err(Error::InvalidAllocation {
            control: 0,
            variant: 0
        })
    ));
    assert!(TrafficAllocation::new(255, 101).is_err());
}

// =============================================================================
// EventRecord Tests
// =============================================================================

#[test]
fn test_event_record_creation() {
    let event = EventRecord::assignment("exp-001", "user-1", Arm::Control);

    assert_eq!(event.experiment_id(), "exp-001");
    assert_eq!(event.user_id(), "user-1");
    assert_eq!(event.event_type(), EventType::Assignment);
    assert_eq!(event.arm(), Arm::Control);
    assert!(event.session_id().is_none());
    assert!(event.metadata().is_none());
}

#[test]
fn test_event_record_with_explicit_timestamp() {
    let ts = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    let event = EventRecord::builder("exp-001", "user-1", EventType::Conversion, Arm::Variant)
        .timestamp(ts)
        .session_id("sess-1")
        .build();

    assert_eq!(event.timestamp(), ts);
    assert_eq!(event.session_id(), Some("sess-1"));
}

#[test]
fn test_event_record_deserializes_wire_format() {
    let json = r#"{
        "event_id": null,
        "experiment_id": "exp-001",
        "user_id": "user-7",
        "session_id": null,
        "event_type": "pageview",
        "arm": "variant",
        "metadata": {"path": "/pricing"},
        "timestamp": "2025-01-15T12:00:00Z"
    }"#;

    let event: EventRecord = serde_json::from_str(json).expect("deserialization failed");
    assert_eq!(event.event_type(), EventType::Pageview);
    assert_eq!(event.arm(), Arm::Variant);
    assert_eq!(event.metadata().unwrap()["path"], "/pricing");
}

#[test]
fn test_event_record_rejects_unknown_arm() {
    let json = r#"{
        "event_id": null, "experiment_id": "e", "user_id": "u", "session_id": null,
        "event_type": "assignment", "arm": "treatment", "metadata": null,
        "timestamp": "2025-01-15T12:00:00Z"
    }"#;
    assert!(serde_json::from_str::<EventRecord>(json).is_err());
}

// =============================================================================
// Collaborator Backends
// =============================================================================

#[tokio::test]
async fn test_experiment_store_reflects_lifecycle() {
    let store = MemoryExperimentStore::new();
    store.upsert(ExperimentRecord::new("exp-001", "Lifecycle"));

    store.update("exp-001", ExperimentRecord::start);
    assert!(store.get("exp-001").await.unwrap().unwrap().is_running());

    store.update("exp-001", ExperimentRecord::complete);
    let experiment = store.get("exp-001").await.unwrap().unwrap();
    assert_eq!(experiment.status(), ExperimentStatus::Completed);
    assert!(experiment.stopped_at().is_some());
}

#[tokio::test]
async fn test_event_log_latest_assignment_by_timestamp() {
    let log = MemoryEventLog::new();
    let base = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();

    for (offset, arm) in [(2, Arm::Variant), (0, Arm::Control), (1, Arm::Control)] {
        let event = EventRecord::builder("exp-001", "user-1", EventType::Assignment, arm)
            .timestamp(base + Duration::minutes(offset))
            .build();
        log.append(event).await.unwrap();
    }

    let latest = log
        .find_latest_assignment("exp-001", "user-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.arm(), Arm::Variant);
    assert_eq!(latest.timestamp(), base + Duration::minutes(2));
    assert!(latest.event_id().is_some());
}
