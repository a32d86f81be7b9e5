// Operation requests and results
//
// Requests carry the raw operation name as supplied by the host; it is only
// parsed when the item is dispatched so that an unknown name becomes a
// per-item error instead of rejecting the whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::credentials::CredentialRecord;
use crate::error::{ConnectorError, Result};

/// Default task queue for StartWorkflow
pub const DEFAULT_TASK_QUEUE: &str = "default";

/// Default workflow input for StartWorkflow
pub const DEFAULT_INPUT: &str = "{}";

/// Operations the connector can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    StartWorkflow,
    GetWorkflowStatus,
    TestConnection,
}

impl Operation {
    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::StartWorkflow => "startWorkflow",
            Operation::GetWorkflowStatus => "getWorkflowStatus",
            Operation::TestConnection => "testConnection",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "startworkflow" | "start" => Ok(Operation::StartWorkflow),
            "getworkflowstatus" | "status" => Ok(Operation::GetWorkflowStatus),
            "testconnection" | "test" => Ok(Operation::TestConnection),
            _ => Err(ConnectorError::input(format!(
                "Unsupported operation: '{}'. Use 'startWorkflow', 'getWorkflowStatus' or 'testConnection'",
                s
            ))),
        }
    }
}

/// Parameters of one input item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    /// Operation name (e.g. "startWorkflow")
    pub operation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_queue: Option<String>,

    /// Workflow input as JSON text
    #[serde(
        default,
        rename = "input",
        alias = "inputJson",
        skip_serializing_if = "Option::is_none"
    )]
    pub input_json: Option<String>,
}

impl OperationRequest {
    /// StartWorkflow request with default task queue and input
    pub fn start_workflow(workflow_id: impl Into<String>, workflow_type: impl Into<String>) -> Self {
        Self {
            operation: Operation::StartWorkflow.as_str().to_string(),
            workflow_id: Some(workflow_id.into()),
            workflow_type: Some(workflow_type.into()),
            ..Default::default()
        }
    }

    /// GetWorkflowStatus request
    pub fn get_workflow_status(workflow_id: impl Into<String>) -> Self {
        Self {
            operation: Operation::GetWorkflowStatus.as_str().to_string(),
            workflow_id: Some(workflow_id.into()),
            ..Default::default()
        }
    }

    /// TestConnection request
    pub fn test_connection() -> Self {
        Self {
            operation: Operation::TestConnection.as_str().to_string(),
            ..Default::default()
        }
    }

    pub fn with_task_queue(mut self, task_queue: impl Into<String>) -> Self {
        self.task_queue = Some(task_queue.into());
        self
    }

    pub fn with_input(mut self, input_json: impl Into<String>) -> Self {
        self.input_json = Some(input_json.into());
        self
    }

    /// Parse the operation name
    pub fn operation(&self) -> Result<Operation> {
        self.operation.parse()
    }

    /// Workflow id, required by StartWorkflow and GetWorkflowStatus
    pub fn workflow_id(&self) -> Result<&str> {
        self.required("workflowId", self.workflow_id.as_deref())
    }

    /// Workflow type, required by StartWorkflow
    pub fn workflow_type(&self) -> Result<&str> {
        self.required("workflowType", self.workflow_type.as_deref())
    }

    // Empty strings count as missing
    fn required<'a>(&self, name: &str, value: Option<&'a str>) -> Result<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ConnectorError::input(format!(
                "Missing required parameter '{}' for operation '{}'",
                name, self.operation
            ))),
        }
    }

    pub fn task_queue_or_default(&self) -> &str {
        match self.task_queue.as_deref().map(str::trim) {
            Some(queue) if !queue.is_empty() => queue,
            _ => DEFAULT_TASK_QUEUE,
        }
    }

    /// Parse the workflow input as a single JSON value
    pub fn parsed_input(&self) -> Result<Value> {
        let raw = match self.input_json.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => DEFAULT_INPUT,
        };

        serde_json::from_str(raw)
            .map_err(|e| ConnectorError::input(format!("Workflow input is not valid JSON: {}", e)))
    }
}

/// Outcome of one input item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationResult {
    /// Error recorded in continue-on-fail mode
    Error { error: String },
    /// Operation-specific success payload
    Success(Value),
}

impl OperationResult {
    pub fn error(message: impl Into<String>) -> Self {
        OperationResult::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OperationResult::Error { .. })
    }

    pub fn as_success(&self) -> Option<&Value> {
        match self {
            OperationResult::Success(value) => Some(value),
            OperationResult::Error { .. } => None,
        }
    }
}

/// One host call: credentials, the batch of items, and the failure policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    /// Credentials; hosts may omit them and supply them out of band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialRecord>,

    #[serde(default)]
    pub items: Vec<OperationRequest>,

    #[serde(default)]
    pub continue_on_fail: bool,
}
