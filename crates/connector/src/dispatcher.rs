// Operation dispatcher
//
// Opens one client per batch, then runs every item against that client in
// input order. Connection failures abort the batch before any item runs;
// per-item failures are recorded or re-raised depending on continue_on_fail.

use chrono::Utc;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::credentials::{resolve, ConnectionConfig, CredentialRecord};
use crate::error::{ConnectorError, Result};
use crate::operation::{Invocation, Operation, OperationRequest, OperationResult};
use crate::remote::{RemoteService, StartWorkflow, WorkflowClient};

/// Lifecycle of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Connecting,
    Connected,
    ProcessingItems,
    Completed,
    AbortedOnItemError,
    ConnectionFailed,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::AbortedOnItemError | BatchState::ConnectionFailed
        )
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Idle => "idle",
            BatchState::Connecting => "connecting",
            BatchState::Connected => "connected",
            BatchState::ProcessingItems => "processing_items",
            BatchState::Completed => "completed",
            BatchState::AbortedOnItemError => "aborted_on_item_error",
            BatchState::ConnectionFailed => "connection_failed",
        };
        f.write_str(name)
    }
}

/// Tracks the state of a batch and logs each transition
struct BatchTracker {
    state: BatchState,
}

impl BatchTracker {
    fn new() -> Self {
        Self {
            state: BatchState::Idle,
        }
    }

    fn transition(&mut self, next: BatchState) {
        debug_assert!(!self.state.is_terminal(), "batch already finished");
        debug!(from = %self.state, to = %next, "Batch state transition");
        self.state = next;
    }
}

/// Dispatches batches of operation requests against a remote service
#[derive(Clone)]
pub struct Dispatcher {
    remote: Arc<dyn RemoteService>,
}

impl Dispatcher {
    /// Create a dispatcher over the given remote service
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self { remote }
    }

    /// Resolve the credentials and run every item of the invocation.
    ///
    /// `credentials` is used when the invocation does not carry its own.
    pub async fn invoke(
        &self,
        invocation: &Invocation,
        credentials: &CredentialRecord,
    ) -> Result<Vec<OperationResult>> {
        let record = invocation.credentials.as_ref().unwrap_or(credentials);
        let config = resolve(record).await?;
        self.run(&config, &invocation.items, invocation.continue_on_fail)
            .await
    }

    /// Run a batch of requests over a single connection.
    ///
    /// Returns one result per request, in input order. Fails without
    /// processing any item when the connection cannot be opened, and, unless
    /// `continue_on_fail` is set, at the first item that fails.
    pub async fn run(
        &self,
        config: &ConnectionConfig,
        requests: &[OperationRequest],
        continue_on_fail: bool,
    ) -> Result<Vec<OperationResult>> {
        let mut tracker = BatchTracker::new();

        tracker.transition(BatchState::Connecting);
        let client = match self.connect(config).await {
            Ok(client) => client,
            Err(e) => {
                tracker.transition(BatchState::ConnectionFailed);
                error!(address = %config.address, error = %e, "Connection phase failed");
                return Err(e);
            }
        };
        tracker.transition(BatchState::Connected);

        tracker.transition(BatchState::ProcessingItems);
        let mut results = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            debug!(index, operation = %request.operation, "Dispatching item");

            match self.execute(client.as_ref(), config, request).await {
                Ok(payload) => results.push(OperationResult::Success(payload)),
                Err(e) if continue_on_fail => {
                    warn!(index, error = %e, "Item failed, continuing");
                    results.push(OperationResult::error(e.to_string()));
                }
                Err(e) => {
                    tracker.transition(BatchState::AbortedOnItemError);
                    error!(index, error = %e, "Item failed, aborting batch");
                    return Err(ConnectorError::item_failed(index, e));
                }
            }
        }

        tracker.transition(BatchState::Completed);
        info!(
            address = %config.address,
            items = results.len(),
            errors = results.iter().filter(|r| r.is_error()).count(),
            "Batch completed"
        );

        Ok(results)
    }

    /// Open the batch connection, bounded by the configured timeout
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn WorkflowClient>> {
        info!(
            address = %config.address,
            namespace = %config.namespace,
            tls = config.tls.is_enabled(),
            timeout_ms = config.timeout_millis,
            "Connecting to Temporal server"
        );

        let client = match tokio::time::timeout(config.timeout(), self.remote.connect(config)).await
        {
            Ok(Ok(client)) => client,
            Ok(Err(e @ ConnectorError::Connection { .. })) => return Err(e),
            Ok(Err(e)) => return Err(ConnectorError::connection(&config.address, e.to_string())),
            Err(_) => {
                return Err(ConnectorError::connection(
                    &config.address,
                    format!("connection timed out after {}ms", config.timeout_millis),
                ))
            }
        };

        info!(address = %config.address, "Connected to Temporal server");
        Ok(client)
    }

    /// Execute one item against the batch client
    async fn execute(
        &self,
        client: &dyn WorkflowClient,
        config: &ConnectionConfig,
        request: &OperationRequest,
    ) -> Result<Value> {
        match request.operation()? {
            Operation::StartWorkflow => start_workflow(client, request).await,
            Operation::GetWorkflowStatus => get_workflow_status(client, request).await,
            Operation::TestConnection => Ok(test_connection(client, config).await),
        }
    }
}

async fn start_workflow(client: &dyn WorkflowClient, request: &OperationRequest) -> Result<Value> {
    let workflow_id = request.workflow_id()?;
    let workflow_type = request.workflow_type()?;
    let task_queue = request.task_queue_or_default();
    let input = request.parsed_input()?;

    info!(
        workflow_id = %workflow_id,
        workflow_type = %workflow_type,
        task_queue = %task_queue,
        "Starting workflow"
    );

    let result = client
        .start_workflow_and_await(StartWorkflow {
            workflow_type: workflow_type.to_string(),
            workflow_id: workflow_id.to_string(),
            task_queue: task_queue.to_string(),
            args: vec![input],
        })
        .await?;

    Ok(json!({ "result": result }))
}

async fn get_workflow_status(
    client: &dyn WorkflowClient,
    request: &OperationRequest,
) -> Result<Value> {
    let workflow_id = request.workflow_id()?;
    let description = client.describe_workflow(workflow_id).await?;

    info!(
        workflow_id = %description.workflow_id,
        run_id = %description.run_id,
        status = %description.status,
        "Fetched workflow status"
    );

    Ok(json!({
        "workflowId": description.workflow_id,
        "runId": description.run_id,
        "status": description.status.name(),
        "startTime": description.start_time,
        "closeTime": description.close_time,
    }))
}

/// Re-probes the batch connection; a failed probe is reported in the payload
/// under `reason` so it never reads as an item error
async fn test_connection(client: &dyn WorkflowClient, config: &ConnectionConfig) -> Value {
    let timestamp = Utc::now();

    match client.probe().await {
        Ok(()) => json!({
            "success": true,
            "message": "Successfully connected to Temporal server",
            "serverAddress": config.address,
            "namespace": config.namespace,
            "timestamp": timestamp,
        }),
        Err(e) => {
            warn!(address = %config.address, error = %e, "Connection test failed");
            json!({
                "success": false,
                "message": "Failed to connect to Temporal server",
                "serverAddress": config.address,
                "namespace": config.namespace,
                "timestamp": timestamp,
                "reason": e.to_string(),
            })
        }
    }
}
