//! Camunda implementation of the ProcessEngine
//!
//! This module provides integration with a Camunda engine over its REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

use super::{ProcessEngine, VariableUpdate};
use crate::error::{ServerError, ServerResult};

/// Camunda REST implementation of ProcessEngine
#[derive(Debug, Clone)]
pub struct CamundaEngine {
    /// Base URL of the engine REST API
    base_url: String,

    /// HTTP client
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ProcessInstanceDto {
    id: String,
}

#[derive(Debug, Deserialize)]
struct HistoricVariableInstanceDto {
    #[serde(rename = "processInstanceId")]
    process_instance_id: String,
}

impl CamundaEngine {
    /// Create a new CamundaEngine. Every call is bounded by `timeout` so a
    /// hung engine cannot stall the caller's request.
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the URL for the running process instance search
    fn process_instance_url(&self) -> String {
        format!("{}/process-instance", self.base_url)
    }

    /// Get the URL for the historic variable instance search
    fn historic_variable_url(&self) -> String {
        format!("{}/history/variable-instance", self.base_url)
    }

    /// Get the URL for pushing variables into a specific instance
    fn instance_variables_url(&self, instance_id: &str) -> String {
        format!("{}/{}/variables", self.process_instance_url(), instance_id)
    }

    /// Get the URL for starting a process by definition key
    fn start_process_url(&self, definition_key: &str) -> String {
        format!(
            "{}/process-definition/key/{}/start",
            self.base_url, definition_key
        )
    }

    /// Get the engine version URL
    fn version_url(&self) -> String {
        format!("{}/version", self.base_url)
    }
}

#[async_trait]
impl ProcessEngine for CamundaEngine {
    async fn search_active_instances(
        &self,
        variable: &str,
        value: &str,
    ) -> ServerResult<Vec<String>> {
        debug!(%variable, %value, "Searching active process instances");

        let filter = format!("{}_eq_{}", variable, value);
        let response = self
            .client
            .get(self.process_instance_url())
            .query(&[("variables", filter.as_str()), ("active", "true")])
            .send()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(%variable, %value, %error_body, "Active instance search failed");
            return Err(ServerError::EngineApiError(format!(
                "Active instance search failed: {}",
                error_body
            )));
        }

        let instances: Vec<ProcessInstanceDto> = response
            .json()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        Ok(instances.into_iter().map(|instance| instance.id).collect())
    }

    async fn search_historic_instances(
        &self,
        variable: &str,
        value: &str,
    ) -> ServerResult<Vec<String>> {
        debug!(%variable, %value, "Searching historic variable instances");

        let response = self
            .client
            .get(self.historic_variable_url())
            .query(&[("variableName", variable), ("variableValue", value)])
            .send()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(%variable, %value, %error_body, "Historic variable search failed");
            return Err(ServerError::EngineApiError(format!(
                "Historic variable search failed: {}",
                error_body
            )));
        }

        let matches: Vec<HistoricVariableInstanceDto> = response
            .json()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        Ok(matches
            .into_iter()
            .map(|entry| entry.process_instance_id)
            .collect())
    }

    async fn submit_variables(
        &self,
        instance_id: &str,
        update: &VariableUpdate,
    ) -> ServerResult<()> {
        debug!(%instance_id, variables = update.len(), "Submitting variables");

        let response = self
            .client
            .post(self.instance_variables_url(instance_id))
            .json(&json!({ "modifications": update }))
            .send()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(%instance_id, %error_body, "Variable submission failed");
            return Err(ServerError::EngineApiError(format!(
                "Variable submission to instance {} failed: {}",
                instance_id, error_body
            )));
        }

        Ok(())
    }

    async fn start_process(
        &self,
        definition_key: &str,
        update: &VariableUpdate,
    ) -> ServerResult<String> {
        debug!(%definition_key, "Starting process instance");

        let response = self
            .client
            .post(self.start_process_url(definition_key))
            .json(&json!({ "variables": update }))
            .send()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(%definition_key, %error_body, "Failed to start process");
            return Err(ServerError::EngineApiError(format!(
                "Failed to start process {}: {}",
                definition_key, error_body
            )));
        }

        let instance: ProcessInstanceDto = response
            .json()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        Ok(instance.id)
    }

    async fn health_check(&self) -> ServerResult<bool> {
        debug!("Performing engine health check");

        let response = self
            .client
            .get(self.version_url())
            .send()
            .await
            .map_err(|e| ServerError::EngineApiError(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::VariableValue;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Create a CamundaEngine instance for testing with mock server
    fn create_test_client(mock_server: &MockServer) -> CamundaEngine {
        CamundaEngine::new(mock_server.uri(), Duration::from_secs(5))
    }

    fn sample_update() -> VariableUpdate {
        let mut update = VariableUpdate::new();
        update.push("providersBudget", VariableValue::Integer(9999));
        update.push(
            "providersComment",
            VariableValue::String("Approved budget".to_string()),
        );
        update
    }

    #[tokio::test]
    async fn test_search_active_instances() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/process-instance"))
            .and(query_param("variables", "contractId_eq_C-100"))
            .and(query_param("active", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "I-1", "definitionId": "Contract_Management_Process:1:abc" },
                { "id": "I-2", "definitionId": "Contract_Management_Process:1:abc" }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let instances = client
            .search_active_instances("contractId", "C-100")
            .await
            .unwrap();

        assert_eq!(instances, vec!["I-1".to_string(), "I-2".to_string()]);
    }

    #[tokio::test]
    async fn test_search_active_instances_empty_result() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/process-instance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let instances = client
            .search_active_instances("contractId", "C-404")
            .await
            .unwrap();

        assert!(instances.is_empty());
    }

    #[tokio::test]
    async fn test_search_active_instances_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/process-instance"))
            .respond_with(ResponseTemplate::new(500).set_body_string("engine exploded"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let result = client.search_active_instances("contractId", "C-100").await;

        match result {
            Err(ServerError::EngineApiError(_)) => {} // Expected
            _ => panic!("Expected ServerError::EngineApiError"),
        }
    }

    #[tokio::test]
    async fn test_search_historic_instances() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/history/variable-instance"))
            .and(query_param("variableName", "contractId"))
            .and(query_param("variableValue", "C-100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "var-1", "processInstanceId": "I-7" },
                { "id": "var-2", "processInstanceId": "I-3" }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let instances = client
            .search_historic_instances("contractId", "C-100")
            .await
            .unwrap();

        assert_eq!(instances, vec!["I-7".to_string(), "I-3".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_variables_posts_modifications() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/process-instance/I-1/variables"))
            .and(body_json(serde_json::json!({
                "modifications": {
                    "providersBudget": { "value": 9999, "type": "Integer" },
                    "providersComment": { "value": "Approved budget", "type": "String" },
                }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let result = client.submit_variables("I-1", &sample_update()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_submit_variables_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/process-instance/I-1/variables"))
            .respond_with(ResponseTemplate::new(404).set_body_string("instance gone"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let result = client.submit_variables("I-1", &sample_update()).await;

        match result {
            Err(ServerError::EngineApiError(detail)) => {
                assert!(detail.contains("I-1"));
            }
            _ => panic!("Expected ServerError::EngineApiError"),
        }
    }

    #[tokio::test]
    async fn test_start_process() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/process-definition/key/Contract_Management_Process/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "I-42",
                "definitionId": "Contract_Management_Process:1:abc"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let mut update = VariableUpdate::new();
        update.push(
            "contractTitle",
            VariableValue::String("Test Contract API".to_string()),
        );

        let instance_id = client
            .start_process("Contract_Management_Process", &update)
            .await
            .unwrap();

        assert_eq!(instance_id, "I-42");
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "version": "7.20.0" })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        assert!(client.health_check().await.unwrap());
    }
}
