// Temporal Connector
//
// Lets a host platform start and inspect Temporal workflow executions.
// The host supplies credentials and a batch of operation requests; the
// dispatcher opens one connection for the batch and returns one result per
// request, in order.
//
// Modules:
// - credentials: credential record -> ConnectionConfig (TLS loading, timeout)
// - dispatcher: per-batch connection and per-item operation dispatch
// - operation: request/result records exchanged with the host
// - remote: traits the dispatcher calls the cluster through
// - memory: in-memory cluster for tests and dry runs
// - probe: HTTP credential check
// - temporal: gRPC backend (feature "temporal")

pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod operation;
pub mod probe;
pub mod remote;
#[cfg(feature = "temporal")]
pub mod temporal;

// Re-export main types
pub use credentials::{resolve, ConnectionConfig, CredentialRecord, TlsMaterial, TlsSetting};
pub use dispatcher::{BatchState, Dispatcher};
pub use error::{ConnectorError, Result};
pub use memory::InMemoryTemporal;
pub use operation::{Invocation, Operation, OperationRequest, OperationResult};
pub use probe::{check_credentials, ProbeReport};
pub use remote::{RemoteService, StartWorkflow, WorkflowClient, WorkflowDescription, WorkflowStatus};
#[cfg(feature = "temporal")]
pub use temporal::TemporalService;
