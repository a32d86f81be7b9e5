// Batch commands: run an invocation file, or build a one-off batch from flags

use anyhow::{Context, Result};
use std::io::Read;
use temporal_connector::{
    CredentialRecord, Dispatcher, Invocation, OperationRequest, OperationResult,
};

use crate::output::{print_field, print_table_header, print_table_row, summarize, OutputFormat};

/// Everything a batch command needs besides its own arguments
pub struct BatchContext {
    pub dispatcher: Dispatcher,
    pub credentials: CredentialRecord,
    pub output: OutputFormat,
    pub quiet: bool,
}

impl BatchContext {
    /// Run an invocation, print its results and hand them back
    pub async fn execute(&self, invocation: &Invocation) -> Result<Vec<OperationResult>> {
        tracing::info!(
            items = invocation.items.len(),
            continue_on_fail = invocation.continue_on_fail,
            "Running batch"
        );

        let results = self
            .dispatcher
            .invoke(invocation, &self.credentials)
            .await?;

        print_results(&results, self.output, self.quiet)?;
        Ok(results)
    }
}

/// Run the invocation stored in `file` ("-" reads stdin)
pub async fn run_file(
    ctx: &BatchContext,
    file: &str,
    continue_on_fail: bool,
) -> Result<Vec<OperationResult>> {
    let mut invocation = load_invocation(file)?;
    invocation.continue_on_fail |= continue_on_fail;
    ctx.execute(&invocation).await
}

/// Start one workflow and wait for its result
pub async fn start(
    ctx: &BatchContext,
    workflow_id: String,
    workflow_type: String,
    task_queue: String,
    input: String,
) -> Result<Vec<OperationResult>> {
    let request = OperationRequest::start_workflow(workflow_id, workflow_type)
        .with_task_queue(task_queue)
        .with_input(input);
    ctx.execute(&single(request)).await
}

/// Describe one or more workflows
pub async fn status(
    ctx: &BatchContext,
    workflow_ids: Vec<String>,
    continue_on_fail: bool,
) -> Result<Vec<OperationResult>> {
    let invocation = Invocation {
        credentials: None,
        items: workflow_ids
            .into_iter()
            .map(OperationRequest::get_workflow_status)
            .collect(),
        continue_on_fail,
    };
    ctx.execute(&invocation).await
}

/// Connect and report connection details, failing when the server
/// rejects the connection test
pub async fn test_connection(ctx: &BatchContext) -> Result<Vec<OperationResult>> {
    let results = ctx
        .execute(&single(OperationRequest::test_connection()))
        .await?;

    if let Some(payload) = results.first().and_then(OperationResult::as_success) {
        if payload["success"] == false {
            let reason = payload["reason"].as_str().unwrap_or("unknown reason");
            anyhow::bail!("Connection test failed: {}", reason);
        }
    }

    Ok(results)
}

fn single(request: OperationRequest) -> Invocation {
    Invocation {
        credentials: None,
        items: vec![request],
        continue_on_fail: false,
    }
}

/// Load an invocation from a JSON or YAML file ("-" reads stdin)
pub fn load_invocation(path: &str) -> Result<Invocation> {
    let content = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read invocation from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path))?
    };

    parse_invocation(path, &content)
}

/// Parse invocation content, detecting the format by extension
pub fn parse_invocation(path: &str, content: &str) -> Result<Invocation> {
    if path.ends_with(".yaml") || path.ends_with(".yml") {
        serde_yaml::from_str(content).with_context(|| format!("Failed to parse YAML: {}", path))
    } else if path.ends_with(".json") {
        serde_json::from_str(content).with_context(|| format!("Failed to parse JSON: {}", path))
    } else {
        serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .with_context(|| format!("Failed to parse invocation (tried JSON and YAML): {}", path))
    }
}

fn print_results(results: &[OperationResult], output: OutputFormat, quiet: bool) -> Result<()> {
    if !output.is_text() {
        return output.print_value(&results);
    }

    // A single successful item reads better as fields than as a table
    if let [OperationResult::Success(serde_json::Value::Object(fields))] = results {
        for (key, value) in fields {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "-".to_string(),
                other => other.to_string(),
            };
            print_field(key, &rendered);
        }
        return Ok(());
    }

    if results.is_empty() {
        if !quiet {
            println!("No items to process");
        }
        return Ok(());
    }

    if !quiet {
        print_table_header(&[("#", 4), ("STATUS", 7), ("DETAIL", 80)]);
    }
    for (index, result) in results.iter().enumerate() {
        let (status, detail) = summarize(result);
        print_table_row(&[(&index.to_string(), 4), (status, 7), (&detail, 80)]);
    }

    Ok(())
}
