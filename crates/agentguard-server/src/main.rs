//! agentguard
//!
//! Moderation and action firewall for LLM agents: serve the HTTP API, run
//! one-shot checks, or verify an audit log.

use agentguard_core::ActionRequest;
use agentguard_server::{build_guardrails, create_router, AppConfig, AppState, ConfigOverrides, DEFAULT_CONFIG_PATH};
use agentguard_telemetry::{read_log, verify_chain};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "agentguard", version)]
#[command(about = "Moderation and action firewall for LLM agents", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AGENTGUARD_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Zero-shot classifier endpoint URL
    #[arg(long, env = "AGENTGUARD_ZERO_SHOT_URL", global = true)]
    zero_shot_url: Option<String>,

    /// Image classifier endpoint URL
    #[arg(long, env = "AGENTGUARD_IMAGE_URL", global = true)]
    image_url: Option<String>,

    /// Audit log file
    #[arg(long, env = "AGENTGUARD_AUDIT_LOG", global = true)]
    audit_log: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Listen address
        #[arg(short = 'l', long)]
        listen: Option<String>,

        /// Listen port
        #[arg(short = 'P', long)]
        port: Option<u16>,

        /// Bearer token required on /v1 routes
        #[arg(long, env = "AGENTGUARD_AUTH_TOKEN", hide_env_values = true)]
        auth_token: Option<String>,
    },

    /// Moderate a piece of text
    CheckText {
        text: String,
    },

    /// Validate an action given as JSON, e.g. '{"kind":"open_file","params":{"filename":"notes.txt"}}'
    CheckAction {
        json: String,
    },

    /// Moderate an image file
    CheckImage {
        path: PathBuf,
    },

    /// Verify the hash chain of an audit log
    VerifyAudit {
        /// Log file (defaults to audit.path from the config)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    let mut overrides = ConfigOverrides {
        zero_shot_url: cli.zero_shot_url.clone(),
        image_url: cli.image_url.clone(),
        audit_log: cli.audit_log.clone(),
        ..Default::default()
    };
    if let Command::Serve { listen, port, auth_token } = &cli.command {
        overrides.host = listen.clone();
        overrides.port = *port;
        overrides.auth_token = auth_token.clone();
    }

    let config = AppConfig::load(&cli.config, &overrides)?;

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::CheckText { text } => {
            let guardrails = build_guardrails(&config)?;
            let decision = guardrails.moderate_text(&text).await;
            guardrails.audit().flush();
            report(&decision, decision.blocked())
        }
        Command::CheckAction { json } => {
            let action: ActionRequest =
                serde_json::from_str(&json).context("action must be JSON with a \"kind\" field")?;
            let guardrails = build_guardrails(&config)?;
            let decision = guardrails.validate_action(&action).await;
            guardrails.audit().flush();
            report(&decision, decision.blocked())
        }
        Command::CheckImage { path } => {
            let guardrails = build_guardrails(&config)?;
            let decision = guardrails.moderate_image(&path).await;
            guardrails.audit().flush();
            report(&decision, decision.blocked())
        }
        Command::VerifyAudit { path } => {
            let path = path
                .or(config.audit.path)
                .context("no audit log given and audit.path is not configured")?;
            verify_audit(&path)
        }
    }
}

async fn serve(config: AppConfig) -> Result<ExitCode> {
    info!("Starting agentguard");

    let metrics_handle = init_metrics()?;
    let state = AppState::from_config(&config, metrics_handle)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(ExitCode::SUCCESS)
}

/// Print `value` as JSON; exit code 1 when blocked
fn report<T: Serialize>(value: &T, blocked: bool) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(if blocked { ExitCode::from(1) } else { ExitCode::SUCCESS })
}

fn verify_audit(path: &std::path::Path) -> Result<ExitCode> {
    let records = read_log(path).with_context(|| format!("reading {}", path.display()))?;

    match verify_chain(&records) {
        None => {
            println!("{}: {} records, chain intact", path.display(), records.len());
            Ok(ExitCode::SUCCESS)
        }
        Some(index) => {
            println!(
                "{}: chain broken at record {} (id {})",
                path.display(),
                index,
                records[index].id
            );
            Ok(ExitCode::from(1))
        }
    }
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, stopping server...");
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("agentguard=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_env("AGENTGUARD_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("agentguard=info"))
    };

    // Logs go to stderr so one-shot commands keep stdout for JSON
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "agentguard_decisions_total",
        "Moderation decisions by source and outcome"
    );
    metrics::describe_histogram!(
        "agentguard_classifier_latency_us",
        metrics::Unit::Microseconds,
        "External classifier latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
