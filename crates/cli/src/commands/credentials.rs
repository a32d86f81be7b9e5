// Credential check command
//
// Probes the server's HTTP namespace endpoint without opening a gRPC
// connection, the same check a host runs when credentials are saved.

use anyhow::{Context, Result};
use temporal_connector::{check_credentials, CredentialRecord};

use crate::output::{print_field, OutputFormat};

pub async fn run(credentials: &CredentialRecord, output: OutputFormat) -> Result<()> {
    let http = reqwest::Client::new();
    let report = check_credentials(&http, credentials)
        .await
        .with_context(|| format!("Failed to reach Temporal server at {}", credentials.address))?;

    if output.is_text() {
        print_field("Success", if report.success { "yes" } else { "no" });
        print_field("Status", &report.status.to_string());
        print_field("URL", &report.url);
        print_field("Message", &report.message);
    } else {
        output.print_value(&report)?;
    }

    if !report.success {
        anyhow::bail!("Credential check failed: {}", report.message);
    }

    Ok(())
}
