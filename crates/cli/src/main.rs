// Temporal Connector CLI
//
// Design Decision: Use clap derive with env fallbacks for credentials.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Logs go to stderr so JSON/YAML on stdout stays parseable.

mod backend;
mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use temporal_connector::credentials::{DEFAULT_ADDRESS, DEFAULT_NAMESPACE};
use temporal_connector::{CredentialRecord, Dispatcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::backend::Backend;
use crate::commands::batch::BatchContext;

#[derive(Parser)]
#[command(name = "temporal-connector")]
#[command(about = "Start and inspect Temporal workflow executions")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Remote backend
    #[arg(long, env = "TEMPORAL_CONNECTOR_BACKEND", default_value = "temporal")]
    pub backend: String,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection credentials, used unless an invocation file carries its own
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Temporal server address (host:port)
    #[arg(long, env = "TEMPORAL_ADDRESS", default_value = DEFAULT_ADDRESS, global = true)]
    pub address: String,

    /// Temporal namespace
    #[arg(long, env = "TEMPORAL_NAMESPACE", default_value = DEFAULT_NAMESPACE, global = true)]
    pub namespace: String,

    /// Path to the TLS client certificate
    #[arg(long, env = "TEMPORAL_TLS_CERT_PATH", default_value = "", global = true)]
    pub tls_cert: String,

    /// Path to the TLS client key
    #[arg(long, env = "TEMPORAL_TLS_KEY_PATH", default_value = "", global = true)]
    pub tls_key: String,

    /// Connect timeout in seconds (default 10)
    #[arg(long, env = "TEMPORAL_CONNECT_TIMEOUT", global = true)]
    pub connect_timeout: Option<f64>,
}

impl ConnectionArgs {
    pub fn to_record(&self) -> CredentialRecord {
        CredentialRecord {
            address: self.address.clone(),
            namespace: self.namespace.clone(),
            tls_cert_path: self.tls_cert.clone(),
            tls_key_path: self.tls_key.clone(),
            connect_timeout_seconds: self.connect_timeout,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a batch of operations from a JSON/YAML invocation file
    Run {
        /// Invocation file ("-" reads stdin)
        #[arg(default_value = "-")]
        file: String,

        /// Record failed items as errors instead of aborting the batch
        #[arg(long)]
        continue_on_fail: bool,
    },

    /// Start a workflow and wait for its result
    Start {
        /// Workflow ID
        #[arg(long)]
        workflow_id: String,

        /// Workflow type
        #[arg(long)]
        workflow_type: String,

        /// Task queue
        #[arg(long, default_value = "default")]
        task_queue: String,

        /// Workflow input as JSON
        #[arg(long, default_value = "{}")]
        input: String,
    },

    /// Get the status of one or more workflows
    Status {
        /// Workflow IDs
        #[arg(required = true)]
        workflow_ids: Vec<String>,

        /// Report unknown workflows inline instead of failing
        #[arg(long)]
        continue_on_fail: bool,
    },

    /// Connect to the server and report connection details
    TestConnection,

    /// Check credentials against the server's HTTP API
    CheckCredentials,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "temporal_connector=warn"
    } else {
        "temporal_connector=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output_format = output::OutputFormat::from_str(&cli.output);
    let credentials = cli.connection.to_record();

    let batch_context = || -> Result<BatchContext> {
        let backend: Backend = cli.backend.parse()?;
        Ok(BatchContext {
            dispatcher: Dispatcher::new(backend::create_remote(backend)?),
            credentials: credentials.clone(),
            output: output_format,
            quiet: cli.quiet,
        })
    };

    match cli.command {
        Commands::Run {
            ref file,
            continue_on_fail,
        } => {
            commands::batch::run_file(&batch_context()?, file, continue_on_fail).await?;
        }
        Commands::Start {
            ref workflow_id,
            ref workflow_type,
            ref task_queue,
            ref input,
        } => {
            commands::batch::start(
                &batch_context()?,
                workflow_id.clone(),
                workflow_type.clone(),
                task_queue.clone(),
                input.clone(),
            )
            .await?;
        }
        Commands::Status {
            ref workflow_ids,
            continue_on_fail,
        } => {
            commands::batch::status(&batch_context()?, workflow_ids.clone(), continue_on_fail)
                .await?;
        }
        Commands::TestConnection => {
            commands::batch::test_connection(&batch_context()?).await?;
        }
        Commands::CheckCredentials => {
            commands::credentials::run(&credentials, output_format).await?;
        }
    }

    Ok(())
}
