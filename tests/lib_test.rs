//! Tests for top-level engine API

use std::time::Duration;

use splitlab::experiment::{
    ExperimentRecord, ExperimentStatus, MemoryEventLog, MemoryExperimentStore,
};
use splitlab::kv::{KvStore, MemoryKvStore};
use splitlab::{EngineConfig, ExperimentEngine};

fn builder() -> splitlab::EngineBuilder<MemoryExperimentStore, MemoryEventLog, MemoryKvStore> {
    ExperimentEngine::builder(
        MemoryExperimentStore::new(),
        MemoryEventLog::new(),
        MemoryKvStore::new(),
    )
}

#[test]
fn test_engine_builder_defaults() {
    let engine = builder().build();
    assert_eq!(engine.config().results_ttl, Duration::from_secs(60));
    assert_eq!(engine.config().assignment_ttl, Duration::from_secs(3600));
}

#[test]
fn test_engine_builder_with_ttls() {
    let engine = builder().results_ttl_secs(5).assignment_ttl_secs(120).build();
    assert_eq!(engine.config().results_ttl, Duration::from_secs(5));
    assert_eq!(engine.config().assignment_ttl, Duration::from_secs(120));
}

#[test]
fn test_engine_builder_with_config() {
    let config: EngineConfig = serde_json::from_str(r#"{"results_ttl": 10}"#).unwrap();
    let engine = builder().config(config).build();

    assert_eq!(engine.config().results_ttl, Duration::from_secs(10));
    // Missing fields fall back to defaults
    assert_eq!(engine.config().assignment_ttl, Duration::from_secs(3600));
}

#[test]
fn test_engine_builder_chain_last_wins() {
    let engine = builder()
        .results_ttl_secs(1)
        .config(EngineConfig::default())
        .results_ttl_secs(30)
        .build();
    assert_eq!(engine.config().results_ttl, Duration::from_secs(30));
}

#[tokio::test]
async fn test_fresh_engine_has_empty_collaborators() {
    let engine = builder().build();
    assert!(engine.experiments().is_empty());
    assert!(engine.events().is_empty());
    assert!(engine.cache().is_empty());

    let results = engine.compute_results("exp-none").await.unwrap();
    assert_eq!(results.control.visitors, 0);
    assert_eq!(results.p_value, 1.0);
}

#[tokio::test]
async fn test_maximum_ttls_serve_from_cache() {
    let engine = builder()
        .results_ttl_secs(u64::MAX)
        .assignment_ttl_secs(u64::MAX)
        .build();
    engine.experiments().upsert(
        ExperimentRecord::builder("exp-1", "long ttl")
            .status(ExperimentStatus::Running)
            .build(),
    );

    let results = engine.compute_results("exp-1").await.unwrap();
    assert!(engine.cache().exists("results:exp-1").await.unwrap());
    assert_eq!(engine.compute_results("exp-1").await.unwrap(), results);

    let arm = engine.resolve_variant("exp-1", "user-1").await.unwrap();
    assert!(engine.cache().exists("assignment:exp-1:user-1").await.unwrap());
    assert_eq!(engine.assign("exp-1", "user-1").await.unwrap(), arm);
}

#[test]
fn test_maximum_ttl_config_parses() {
    let json = format!(r#"{{"results_ttl": {}, "assignment_ttl": {}}}"#, u64::MAX, u64::MAX);
    let config: EngineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config.results_ttl, Duration::from_secs(u64::MAX));
}
