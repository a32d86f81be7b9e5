// In-memory Temporal backend for tests and dry runs
//
// Workflows "complete" as soon as they are started and return their first
// argument as the result. Failures can be injected for connect, start (per
// workflow type) and probe. Every connect and start call is recorded.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::credentials::ConnectionConfig;
use crate::error::{ConnectorError, Result};
use crate::remote::{
    RemoteService, StartWorkflow, WorkflowClient, WorkflowDescription, WorkflowStatus,
};

#[derive(Debug, Default)]
struct State {
    workflows: HashMap<String, WorkflowDescription>,
    started: Vec<StartWorkflow>,
    connections: Vec<ConnectionConfig>,
    connect_failure: Option<String>,
    failing_types: HashMap<String, String>,
    results: HashMap<String, Value>,
    probe_failure: Option<String>,
}

/// In-memory Temporal cluster
///
/// Cloning shares the underlying state, so a test can keep a handle for
/// assertions while the dispatcher owns another.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTemporal {
    state: Arc<RwLock<State>>,
}

impl InMemoryTemporal {
    /// Create an empty in-memory cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every connect attempt fail with the given reason
    pub async fn fail_connect(&self, reason: impl Into<String>) {
        self.state.write().await.connect_failure = Some(reason.into());
    }

    /// Make starts of the given workflow type fail with the given message
    pub async fn fail_workflow_type(&self, workflow_type: impl Into<String>, message: impl Into<String>) {
        self.state
            .write()
            .await
            .failing_types
            .insert(workflow_type.into(), message.into());
    }

    /// Return a fixed result for the given workflow type instead of echoing input
    pub async fn set_result(&self, workflow_type: impl Into<String>, result: Value) {
        self.state
            .write()
            .await
            .results
            .insert(workflow_type.into(), result);
    }

    /// Make connection probes fail with the given message
    pub async fn fail_probe(&self, message: impl Into<String>) {
        self.state.write().await.probe_failure = Some(message.into());
    }

    /// Pre-populate a workflow (useful for status queries)
    pub async fn seed_workflow(&self, description: WorkflowDescription) {
        self.state
            .write()
            .await
            .workflows
            .insert(description.workflow_id.clone(), description);
    }

    /// All start requests received, in order
    pub async fn started(&self) -> Vec<StartWorkflow> {
        self.state.read().await.started.clone()
    }

    /// All configurations a connection was opened with, in order
    pub async fn connections(&self) -> Vec<ConnectionConfig> {
        self.state.read().await.connections.clone()
    }
}

#[async_trait]
impl RemoteService for InMemoryTemporal {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn WorkflowClient>> {
        let mut state = self.state.write().await;
        state.connections.push(config.clone());

        if let Some(reason) = &state.connect_failure {
            return Err(ConnectorError::connection(&config.address, reason.clone()));
        }

        debug!(address = %config.address, "In-memory connection opened");
        Ok(Box::new(InMemoryClient {
            state: self.state.clone(),
            namespace: config.namespace.clone(),
        }))
    }
}

struct InMemoryClient {
    state: Arc<RwLock<State>>,
    namespace: String,
}

#[async_trait]
impl WorkflowClient for InMemoryClient {
    async fn start_workflow_and_await(&self, request: StartWorkflow) -> Result<Value> {
        let mut state = self.state.write().await;
        state.started.push(request.clone());

        if let Some(message) = state.failing_types.get(&request.workflow_type) {
            return Err(ConnectorError::remote(message.clone()));
        }

        if let Some(existing) = state.workflows.get(&request.workflow_id) {
            if !existing.status.is_closed() {
                return Err(ConnectorError::remote(format!(
                    "Workflow execution already started: {}",
                    request.workflow_id
                )));
            }
        }

        let result = state
            .results
            .get(&request.workflow_type)
            .cloned()
            .unwrap_or_else(|| request.args.first().cloned().unwrap_or(Value::Null));

        let now = Utc::now();
        state.workflows.insert(
            request.workflow_id.clone(),
            WorkflowDescription {
                workflow_id: request.workflow_id.clone(),
                run_id: Uuid::now_v7().to_string(),
                status: WorkflowStatus::Completed,
                start_time: Some(now),
                close_time: Some(now),
            },
        );

        debug!(
            namespace = %self.namespace,
            workflow_id = %request.workflow_id,
            "In-memory workflow completed"
        );

        Ok(result)
    }

    async fn describe_workflow(&self, workflow_id: &str) -> Result<WorkflowDescription> {
        self.state
            .read()
            .await
            .workflows
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| {
                ConnectorError::remote(format!("Workflow not found: {}", workflow_id))
            })
    }

    async fn probe(&self) -> Result<()> {
        match &self.state.read().await.probe_failure {
            Some(message) => Err(ConnectorError::remote(message.clone())),
            None => Ok(()),
        }
    }
}
