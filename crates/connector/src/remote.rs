// Remote service seam
//
// The dispatcher talks to the Temporal cluster only through these traits.
// RemoteService opens one WorkflowClient per batch; the client is then
// passed by reference into every operation of that batch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::credentials::ConnectionConfig;
use crate::error::Result;

/// Request to start a workflow and wait for its result
#[derive(Debug, Clone, PartialEq)]
pub struct StartWorkflow {
    pub workflow_type: String,
    pub workflow_id: String,
    pub task_queue: String,
    /// Positional workflow arguments (the connector always sends exactly one)
    pub args: Vec<Value>,
}

/// Execution status of a workflow, named the way Temporal SDKs report it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Unspecified,
    Running,
    Completed,
    Failed,
    Cancelled,
    Terminated,
    ContinuedAsNew,
    TimedOut,
}

impl WorkflowStatus {
    /// Symbolic name of the status
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowStatus::Unspecified => "UNSPECIFIED",
            WorkflowStatus::Running => "RUNNING",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Failed => "FAILED",
            WorkflowStatus::Cancelled => "CANCELLED",
            WorkflowStatus::Terminated => "TERMINATED",
            WorkflowStatus::ContinuedAsNew => "CONTINUED_AS_NEW",
            WorkflowStatus::TimedOut => "TIMED_OUT",
        }
    }

    /// Whether the execution has finished; open executions block a new start
    pub fn is_closed(&self) -> bool {
        !matches!(self, WorkflowStatus::Running | WorkflowStatus::Unspecified)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current descriptor of a workflow execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDescription {
    pub workflow_id: String,
    pub run_id: String,
    pub status: WorkflowStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
}

/// Opens client connections to a Temporal cluster
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Connect to the server described by `config`.
    ///
    /// The dispatcher bounds this call with the configured timeout; any
    /// error returned here is reported as a connection failure.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn WorkflowClient>>;
}

/// A live client bound to one namespace
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Start a workflow and wait until it completes, returning its result
    async fn start_workflow_and_await(&self, request: StartWorkflow) -> Result<Value>;

    /// Describe the latest run of the workflow with the given id
    async fn describe_workflow(&self, workflow_id: &str) -> Result<WorkflowDescription>;

    /// Cheap round trip proving the connection and namespace are usable
    async fn probe(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names_match_serde() {
        for status in [
            WorkflowStatus::Running,
            WorkflowStatus::ContinuedAsNew,
            WorkflowStatus::TimedOut,
        ] {
            let serialized = serde_json::to_value(status).unwrap();
            assert_eq!(serialized, Value::String(status.name().to_string()));
        }
    }

    #[test]
    fn test_closed_statuses() {
        assert!(!WorkflowStatus::Running.is_closed());
        assert!(WorkflowStatus::Completed.is_closed());
        assert!(WorkflowStatus::Terminated.is_closed());
    }
}
