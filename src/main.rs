//! Command-line client for an API server.
//!
//! Every call goes through the full request pipeline:
//!
//! ```text
//!   logging → request headers → auth → retry → exception handling → reqwest
//! ```
//!
//! Ctrl+C or `--timeout-secs` cancels the in-flight call, including any
//! backoff wait between retries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use url::Url;

use client_pipeline::api::ApiClient;
use client_pipeline::auth::{Credential, SessionStore};
use client_pipeline::config::{load_config, PipelineConfig};
use client_pipeline::http::{OutboundRequest, PipelineBuilder, ReqwestTransport};
use client_pipeline::lifecycle::{signals, CancelHandle};
use client_pipeline::observability::logging::init_tracing;

#[derive(Parser)]
#[command(name = "client-pipeline")]
#[command(about = "Send requests through the client request pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bearer access token.
    #[arg(short, long)]
    token: Option<String>,

    /// Cancel the call after this many seconds, retries included.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request to a path relative to the server address
    Send {
        /// HTTP method (GET, POST, ...)
        method: String,
        /// Path, e.g. api/Statistics/GetNugetStats/Bit.BlazorUI
        path: String,
        /// Request body
        #[arg(short, long)]
        body: Option<String>,
        /// Allow retries even if the method is not idempotent
        #[arg(long)]
        retry_safe: bool,
    },
    /// Ask the server what it sees of this client
    Diagnostics,
    /// Download totals for a NuGet package
    NugetStats {
        /// Package id, e.g. Bit.BlazorUI
        #[arg(default_value = "Bit.BlazorUI")]
        package_id: String,
    },
    /// Star and fork counts of the bitplatform repository on GitHub
    GithubStats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    init_tracing(&config.observability);

    tracing::info!(
        base_url = %config.transport.base_url,
        max_attempts = config.retries.max_attempts,
        request_timeout_secs = config.transport.request_timeout_secs,
        "Configuration loaded"
    );

    let session = Arc::new(SessionStore::new());
    if let Some(token) = cli.token.clone() {
        session.sign_in(Credential::new(token));
    }

    let transport = ReqwestTransport::new(&config.transport)?;
    let pipeline = PipelineBuilder::from_config(&config, session.clone())?.build(transport);
    let api = ApiClient::new(pipeline, Url::parse(&config.transport.base_url)?);

    let (handle, cancel) = CancelHandle::new();
    if let Some(secs) = cli.timeout_secs {
        handle.cancel_after(Duration::from_secs(secs));
    }
    tokio::spawn(signals::cancel_on_ctrl_c(handle));

    match cli.command {
        Commands::Send {
            method,
            path,
            body,
            retry_safe,
        } => {
            let method = method.to_uppercase().parse::<http::Method>()?;
            let mut request = OutboundRequest::new(method, api.url(&path)?).with_cancellation(cancel);
            if let Some(body) = body {
                request = request.with_body(body);
            }
            if retry_safe {
                request = request.with_retry_safe(true);
            }
            let response = api.send(request).await?;
            println!("{}", response.status());
            println!("{}", String::from_utf8_lossy(response.body()));
        }
        Commands::Diagnostics => {
            let report = api.perform_diagnostics(cancel).await?;
            println!("{}", report);
        }
        Commands::NugetStats { package_id } => {
            let stats = api.get_nuget_stats(&package_id, cancel).await?;
            println!("{}: {} downloads", package_id, stats.total_downloads);
        }
        Commands::GithubStats => {
            let stats = api.get_github_stats(cancel).await?;
            println!(
                "{}: {} stars, {} forks, {} open issues",
                stats.full_name, stats.stargazers_count, stats.forks_count, stats.open_issues_count
            );
        }
    }

    Ok(())
}
