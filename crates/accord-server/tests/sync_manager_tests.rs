use std::sync::Arc;

use accord_record_store::{
    memory::InMemoryRecordStore, ContractId, ContractRecord, ContractStatus, ProviderFieldUpdate,
    RecordStore,
};
use accord_server::engine::{ProcessEngine, VariableUpdate, VariableValue};
use accord_server::error::ServerError;
use accord_server::sync::{CorrelationResolver, SyncExecutor, SyncManager};
use chrono::{DateTime, Utc};
use mockall::predicate::*;
use serde_json::json;

// Implement our own test tracing initialization
fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("accord_server=debug".parse().unwrap())
                .add_directive("test=debug".parse().unwrap()),
        )
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

// Mock implementation for ProcessEngine
mockall::mock! {
    #[derive(Debug)]
    pub Engine {}

    #[async_trait::async_trait]
    impl ProcessEngine for Engine {
        async fn search_active_instances(&self, variable: &str, value: &str) -> Result<Vec<String>, accord_server::error::ServerError>;
        async fn search_historic_instances(&self, variable: &str, value: &str) -> Result<Vec<String>, accord_server::error::ServerError>;
        async fn submit_variables(&self, instance_id: &str, update: &VariableUpdate) -> Result<(), accord_server::error::ServerError>;
        async fn start_process(&self, definition_key: &str, update: &VariableUpdate) -> Result<String, accord_server::error::ServerError>;
        async fn health_check(&self) -> Result<bool, accord_server::error::ServerError>;
    }
}

/// Helper to create a contract record for seeding the store
fn create_test_record(contract_id: &str, status: ContractStatus) -> ContractRecord {
    ContractRecord {
        contract_id: ContractId::new(contract_id),
        contract_title: "Test Contract API".to_string(),
        contract_type: Some("Procurement".to_string()),
        request_type: Some("New".to_string()),
        status,
        created_at: DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
        providers_budget: None,
        providers_comment: None,
        meet_requirement: None,
        providers_name: None,
    }
}

/// Wire a SyncManager over the mocked engine and an in-memory store
fn create_sync_manager(engine: MockEngine, store: Arc<InMemoryRecordStore>) -> SyncManager {
    let engine: Arc<dyn ProcessEngine> = Arc::new(engine);

    SyncManager::new(
        store,
        CorrelationResolver::new(engine.clone(), "contractId".to_string()),
        SyncExecutor::new(engine),
    )
}

#[tokio::test]
async fn test_empty_update_is_rejected_before_persisting() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    // No expectations: any engine call would panic the test
    let engine = MockEngine::new();
    let manager = create_sync_manager(engine, store.clone());

    let result = manager
        .synchronize(&ContractId::new("C-100"), &ProviderFieldUpdate::default())
        .await;

    match result {
        Err(ServerError::ValidationError(_)) => {} // Expected
        other => panic!("Expected ValidationError, got {:?}", other.map(|_| ())),
    }

    // The record was not touched
    let record = store.find_by_key(&ContractId::new("C-100")).await.unwrap();
    assert_eq!(record.providers_budget, None);
}

#[tokio::test]
async fn test_unknown_contract_is_not_found_and_never_resolved() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    let engine = MockEngine::new();
    let manager = create_sync_manager(engine, store);

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!(9999)),
        ..Default::default()
    };
    let result = manager
        .synchronize(&ContractId::new("C-404"), &update)
        .await;

    assert!(matches!(result, Err(ref err) if err.is_not_found()));
}

#[tokio::test]
async fn test_no_instance_anywhere_still_commits_the_mutation() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .with(eq("contractId"), eq("C-100"))
        .returning(|_, _| Ok(vec![]));
    engine
        .expect_search_historic_instances()
        .with(eq("contractId"), eq("C-100"))
        .returning(|_, _| Ok(vec![]));
    engine.expect_submit_variables().never();

    let manager = create_sync_manager(engine, store.clone());

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!(9999)),
        ..Default::default()
    };
    let report = manager
        .synchronize(&ContractId::new("C-100"), &update)
        .await
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert!(!report.degraded);

    let record = store.find_by_key(&ContractId::new("C-100")).await.unwrap();
    assert_eq!(record.providers_budget, Some(9999));
}

#[tokio::test]
async fn test_active_match_never_falls_back_to_history() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .returning(|_, _| Ok(vec!["I-1".to_string()]));
    engine.expect_search_historic_instances().never();
    engine
        .expect_submit_variables()
        .withf(|instance_id, _| instance_id == "I-1")
        .times(1)
        .returning(|_, _| Ok(()));

    let manager = create_sync_manager(engine, store);

    let update = ProviderFieldUpdate {
        providers_comment: Some("Looks good".to_string()),
        ..Default::default()
    };
    let report = manager
        .synchronize(&ContractId::new("C-100"), &update)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].instance_id, "I-1");
    assert!(report.outcomes[0].success);
}

#[tokio::test]
async fn test_historical_fallback_targets_only_the_first_match() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .returning(|_, _| Ok(vec![]));
    engine
        .expect_search_historic_instances()
        .returning(|_, _| Ok(vec!["I-9".to_string(), "I-8".to_string()]));
    engine
        .expect_submit_variables()
        .withf(|instance_id, _| instance_id == "I-9")
        .times(1)
        .returning(|_, _| Ok(()));

    let manager = create_sync_manager(engine, store);

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!(100)),
        ..Default::default()
    };
    let report = manager
        .synchronize(&ContractId::new("C-100"), &update)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].instance_id, "I-9");
}

#[tokio::test]
async fn test_provider_update_scenario_end_to_end() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Submitted))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .with(eq("contractId"), eq("C-100"))
        .returning(|_, _| Ok(vec!["I-1".to_string()]));
    engine.expect_search_historic_instances().never();
    engine
        .expect_submit_variables()
        .withf(|instance_id, update| {
            instance_id == "I-1"
                && update.len() == 2
                && update.get("providersBudget") == Some(&VariableValue::Integer(9999))
                && update.get("providersComment")
                    == Some(&VariableValue::String("Approved budget".to_string()))
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let manager = create_sync_manager(engine, store);

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!(9999)),
        providers_comment: Some("Approved budget".to_string()),
        ..Default::default()
    };
    let report = manager
        .synchronize(&ContractId::new("C-100"), &update)
        .await
        .unwrap();

    assert_eq!(report.record.status, ContractStatus::Running);
    assert_eq!(report.record.providers_budget, Some(9999));
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].instance_id, "I-1");
    assert!(report.outcomes[0].success);
    assert!(!report.degraded);
}

#[tokio::test]
async fn test_resolution_failure_is_contained_and_reported_degraded() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .returning(|_, _| Err(ServerError::EngineApiError("search timed out".to_string())));
    engine
        .expect_search_historic_instances()
        .returning(|_, _| Ok(vec![]));
    engine.expect_submit_variables().never();

    let manager = create_sync_manager(engine, store.clone());

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!(9999)),
        providers_comment: Some("Approved budget".to_string()),
        ..Default::default()
    };
    let report = manager
        .synchronize(&ContractId::new("C-100"), &update)
        .await
        .unwrap();

    // The mutation succeeded even though resolution never answered
    assert!(report.outcomes.is_empty());
    assert!(report.degraded);

    let record = store.find_by_key(&ContractId::new("C-100")).await.unwrap();
    assert_eq!(record.providers_budget, Some(9999));
}

#[tokio::test]
async fn test_build_failure_prevents_delivery_but_the_mutation_stands() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .returning(|_, _| Ok(vec!["I-1".to_string()]));
    engine.expect_search_historic_instances().never();
    engine.expect_submit_variables().never();

    let manager = create_sync_manager(engine, store.clone());

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!("nine thousand")),
        providers_comment: Some("Approved budget".to_string()),
        ..Default::default()
    };
    let report = manager
        .synchronize(&ContractId::new("C-100"), &update)
        .await
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert!(report.degraded);

    // The coercible fields were committed, the budget was left untouched
    let record = store.find_by_key(&ContractId::new("C-100")).await.unwrap();
    assert_eq!(record.providers_budget, None);
    assert_eq!(record.providers_comment.as_deref(), Some("Approved budget"));
}

#[tokio::test]
async fn test_one_delivery_failure_never_suppresses_sibling_deliveries() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .returning(|_, _| Ok(vec!["I-1".to_string(), "I-2".to_string()]));
    engine.expect_search_historic_instances().never();
    engine
        .expect_submit_variables()
        .times(2)
        .returning(|instance_id, _| {
            if instance_id == "I-1" {
                Err(ServerError::EngineApiError("instance suspended".to_string()))
            } else {
                Ok(())
            }
        });

    let manager = create_sync_manager(engine, store);

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!(9999)),
        ..Default::default()
    };
    let report = manager
        .synchronize(&ContractId::new("C-100"), &update)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert!(!report.outcomes[0].success);
    assert!(report.outcomes[0].detail.is_some());
    assert!(report.outcomes[1].success);
    assert!(!report.degraded);
}

#[tokio::test]
async fn test_repeated_synchronize_delivers_again_without_deduplication() {
    init_test_tracing();

    let store = Arc::new(InMemoryRecordStore::new());
    store
        .insert(create_test_record("C-100", ContractStatus::Running))
        .await
        .unwrap();

    let mut engine = MockEngine::new();
    engine
        .expect_search_active_instances()
        .times(2)
        .returning(|_, _| Ok(vec!["I-1".to_string()]));
    engine
        .expect_submit_variables()
        .withf(|instance_id, _| instance_id == "I-1")
        .times(2)
        .returning(|_, _| Ok(()));

    let manager = create_sync_manager(engine, store);

    let update = ProviderFieldUpdate {
        providers_budget: Some(json!(9999)),
        ..Default::default()
    };

    for _ in 0..2 {
        let report = manager
            .synchronize(&ContractId::new("C-100"), &update)
            .await
            .unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].success);
    }
}
