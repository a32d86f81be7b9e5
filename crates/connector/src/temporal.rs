// Temporal gRPC backend
// Decision: Wrap the temporalio-client APIs behind the RemoteService seam
//
// This module provides:
// - Connection management (optional mutual TLS) to a Temporal server
// - Start-and-await via the untyped workflow handle
// - Workflow describe and namespace probe

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

use temporalio_client::{
    Client, ClientOptions, ClientTlsOptions, GetWorkflowResultOpts, Namespace, RetryClient,
    TlsOptions, WfClientExt, WorkflowClientTrait, WorkflowExecutionResult, WorkflowOptions,
};
use temporalio_common::protos::temporal::api::common::v1::Payload;
use temporalio_common::protos::temporal::api::enums::v1::WorkflowExecutionStatus;

use crate::credentials::{ConnectionConfig, TlsSetting};
use crate::error::{ConnectorError, Result};
use crate::remote::{
    RemoteService, StartWorkflow, WorkflowClient, WorkflowDescription, WorkflowStatus,
};

const JSON_ENCODING: &[u8] = b"json/plain";
const NULL_ENCODING: &[u8] = b"binary/null";

/// Remote service backed by a real Temporal server
#[derive(Debug, Clone)]
pub struct TemporalService {
    client_name: String,
}

impl Default for TemporalService {
    fn default() -> Self {
        Self {
            client_name: "temporal-connector".to_string(),
        }
    }
}

impl TemporalService {
    pub fn new() -> Self {
        Self::default()
    }

    fn client_options(&self, config: &ConnectionConfig) -> anyhow::Result<ClientOptions> {
        let scheme = if config.tls.is_enabled() { "https" } else { "http" };
        let target_url: url::Url = format!("{}://{}", scheme, config.address)
            .parse()
            .context("Invalid Temporal address")?;

        let tls = match &config.tls {
            TlsSetting::Enabled(material) => Some(TlsOptions {
                server_root_ca_cert: None,
                domain: None,
                client_tls_options: Some(ClientTlsOptions {
                    client_cert: material.cert.clone(),
                    client_private_key: material.key.clone(),
                }),
            }),
            TlsSetting::Disabled => None,
        };

        Ok(ClientOptions::builder()
            .target_url(target_url)
            .client_name(self.client_name.clone())
            .client_version(env!("CARGO_PKG_VERSION"))
            .identity(format!("{}-{}", self.client_name, uuid::Uuid::now_v7()))
            .maybe_tls_options(tls)
            .build())
    }
}

#[async_trait]
impl RemoteService for TemporalService {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn WorkflowClient>> {
        let options = self
            .client_options(config)
            .map_err(|e| ConnectorError::connection(&config.address, format!("{:#}", e)))?;

        let client = options
            .connect(config.namespace.clone(), None)
            .await
            .map_err(|e| ConnectorError::connection(&config.address, e.to_string()))?;

        info!(
            address = %config.address,
            namespace = %config.namespace,
            "Temporal client connected"
        );

        Ok(Box::new(TemporalWorkflowClient {
            client,
            namespace: config.namespace.clone(),
        }))
    }
}

struct TemporalWorkflowClient {
    client: RetryClient<Client>,
    namespace: String,
}

#[async_trait]
impl WorkflowClient for TemporalWorkflowClient {
    async fn start_workflow_and_await(&self, request: StartWorkflow) -> Result<Value> {
        let payloads = request
            .args
            .iter()
            .map(json_payload)
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .client
            .start_workflow(
                payloads,
                request.task_queue.clone(),
                request.workflow_id.clone(),
                request.workflow_type.clone(),
                None, // request_id
                WorkflowOptions::default(),
            )
            .await
            .map_err(|status| ConnectorError::remote(status.message()))?;

        debug!(
            workflow_id = %request.workflow_id,
            temporal_run_id = %response.run_id,
            "Workflow started, waiting for result"
        );

        let handle = self
            .client
            .get_untyped_workflow_handle(request.workflow_id.clone(), response.run_id);

        let outcome = handle
            .get_workflow_result(GetWorkflowResultOpts::default())
            .await
            .map_err(|e| ConnectorError::remote(format!("{:#}", e)))?;

        match outcome {
            WorkflowExecutionResult::Succeeded(payloads) => match payloads.first() {
                Some(payload) => decode_payload(payload),
                None => Ok(Value::Null),
            },
            WorkflowExecutionResult::Failed(failure) => {
                Err(ConnectorError::remote(failure.message))
            }
            _ => Err(ConnectorError::remote(format!(
                "Workflow {} closed without completing",
                request.workflow_id
            ))),
        }
    }

    async fn describe_workflow(&self, workflow_id: &str) -> Result<WorkflowDescription> {
        let response = self
            .client
            .describe_workflow_execution(workflow_id.to_string(), None)
            .await
            .map_err(|status| ConnectorError::remote(status.message()))?;

        let info = response.workflow_execution_info.ok_or_else(|| {
            ConnectorError::remote(format!("No execution info returned for {}", workflow_id))
        })?;

        let (workflow_id, run_id) = match info.execution {
            Some(execution) => (execution.workflow_id, execution.run_id),
            None => (workflow_id.to_string(), String::new()),
        };

        Ok(WorkflowDescription {
            workflow_id,
            run_id,
            status: status_from_proto(info.status),
            start_time: info
                .start_time
                .and_then(|t| timestamp(t.seconds, t.nanos)),
            close_time: info
                .close_time
                .and_then(|t| timestamp(t.seconds, t.nanos)),
        })
    }

    async fn probe(&self) -> Result<()> {
        self.client
            .describe_namespace(Namespace::Name(self.namespace.clone()))
            .await
            .map_err(|status| ConnectorError::remote(status.message()))?;
        Ok(())
    }
}

fn json_payload(value: &Value) -> Result<Payload> {
    let data = serde_json::to_vec(value)
        .map_err(|e| ConnectorError::input(format!("Failed to serialize workflow input: {}", e)))?;

    Ok(Payload {
        metadata: HashMap::from([("encoding".to_string(), JSON_ENCODING.to_vec())]),
        data,
        ..Default::default()
    })
}

fn decode_payload(payload: &Payload) -> Result<Value> {
    let encoding = payload.metadata.get("encoding").map(Vec::as_slice);
    if encoding == Some(NULL_ENCODING) || payload.data.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&payload.data)
        .map_err(|e| ConnectorError::remote(format!("Workflow result is not JSON: {}", e)))
}

fn status_from_proto(status: i32) -> WorkflowStatus {
    match WorkflowExecutionStatus::try_from(status) {
        Ok(WorkflowExecutionStatus::Running) => WorkflowStatus::Running,
        Ok(WorkflowExecutionStatus::Completed) => WorkflowStatus::Completed,
        Ok(WorkflowExecutionStatus::Failed) => WorkflowStatus::Failed,
        Ok(WorkflowExecutionStatus::Canceled) => WorkflowStatus::Cancelled,
        Ok(WorkflowExecutionStatus::Terminated) => WorkflowStatus::Terminated,
        Ok(WorkflowExecutionStatus::ContinuedAsNew) => WorkflowStatus::ContinuedAsNew,
        Ok(WorkflowExecutionStatus::TimedOut) => WorkflowStatus::TimedOut,
        _ => WorkflowStatus::Unspecified,
    }
}

fn timestamp(seconds: i64, nanos: i32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, nanos.max(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_payload_roundtrip() {
        let payload = json_payload(&json!({"a": 1})).unwrap();
        assert_eq!(
            payload.metadata.get("encoding").map(Vec::as_slice),
            Some(JSON_ENCODING)
        );
        assert_eq!(decode_payload(&payload).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_null_payload() {
        let payload = Payload {
            metadata: HashMap::from([("encoding".to_string(), NULL_ENCODING.to_vec())]),
            data: Vec::new(),
            ..Default::default()
        };
        assert_eq!(decode_payload(&payload).unwrap(), Value::Null);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_from_proto(WorkflowExecutionStatus::Canceled as i32),
            WorkflowStatus::Cancelled
        );
        assert_eq!(status_from_proto(999), WorkflowStatus::Unspecified);
    }

    #[test]
    fn test_tls_switches_scheme() {
        let service = TemporalService::new();
        let mut config = ConnectionConfig::plaintext("temporal.example.com:7233", "default");
        assert!(service.client_options(&config).is_ok());

        config.tls = TlsSetting::Enabled(crate::credentials::TlsMaterial {
            cert: b"cert".to_vec(),
            key: b"key".to_vec(),
        });
        let options = service.client_options(&config).unwrap();
        assert_eq!(options.target_url.scheme(), "https");
    }
}
