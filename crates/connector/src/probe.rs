// HTTP credential probe
//
// Verifies a credential record without opening a gRPC connection by asking
// the server's HTTP API for the configured namespace. A 200 response means
// the address and namespace are usable.

use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::credentials::CredentialRecord;
use crate::error::Result;

/// Message reported when the probe succeeds
pub const PROBE_SUCCESS_MESSAGE: &str = "Connection to Temporal server successful";

/// Outcome of a credential probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub success: bool,
    pub status: u16,
    pub url: String,
    pub message: String,
}

/// URL of the namespace resource for the record
pub fn namespace_url(record: &CredentialRecord) -> String {
    let address = record.address.trim().trim_end_matches('/');
    let base = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };
    format!("{}/api/v1/namespaces/{}", base, record.namespace)
}

/// Probe the namespace endpoint described by the credential record.
///
/// Transport failures are errors; any HTTP response, successful or not,
/// produces a report.
pub async fn check_credentials(
    http: &reqwest::Client,
    record: &CredentialRecord,
) -> Result<ProbeReport> {
    let url = namespace_url(record);
    info!(url = %url, "Probing Temporal namespace endpoint");

    let response = http
        .get(&url)
        .timeout(Duration::from_millis(record.timeout_millis()))
        .send()
        .await?;

    let status = response.status();
    let message = if status == reqwest::StatusCode::OK {
        PROBE_SUCCESS_MESSAGE.to_string()
    } else {
        let body = response.text().await.unwrap_or_default();
        if body.is_empty() {
            format!("Unexpected response status {}", status)
        } else {
            format!("Unexpected response status {}: {}", status, body)
        }
    };

    Ok(ProbeReport {
        success: status == reqwest::StatusCode::OK,
        status: status.as_u16(),
        url,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_url() {
        let record = CredentialRecord::new("temporal.local:7233").with_namespace("orders");
        assert_eq!(
            namespace_url(&record),
            "http://temporal.local:7233/api/v1/namespaces/orders"
        );

        let record = CredentialRecord::new("https://temporal.example.com/");
        assert_eq!(
            namespace_url(&record),
            "https://temporal.example.com/api/v1/namespaces/default"
        );
    }
}
