//! appconfig-sidecar - serves the latest remote configuration over HTTP.

use anyhow::{Context, Result};
use appconfig_sidecar::core::{PollerExit, Sidecar};
use appconfig_sidecar::sources::{AppConfigDataService, Settings, SsmParameterStore};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "appconfig-sidecar",
    about = "Polls a remote configuration session and serves the latest configuration"
)]
struct Cli {
    /// Port to run the server on (default: 80, or SIDECAR_PORT).
    #[arg(short, long)]
    port: Option<u16>,
    /// Environment file loaded before anything else.
    #[arg(long, value_name = "FILE", default_value = ".env")]
    env_file: PathBuf,
    /// Namespace holding the deployment parameters.
    #[arg(long, value_name = "PREFIX")]
    parameter_prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before the subscriber so RUST_LOG may come from the file.
    let env_file = Settings::load_env_file(&cli.env_file);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Fatal errors are reported once, by anyhow, when main returns.
    env_file.context("Failed to load env file")?;

    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(prefix) = cli.parameter_prefix {
        settings.parameter_prefix = prefix;
    }

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    info!(region = ?sdk_config.region(), "AWS configuration loaded");

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let builder = Sidecar::builder()
        .with_settings(&settings)
        .with_parameter_store(Arc::new(SsmParameterStore::new(&sdk_config)))
        .with_configuration_service(Arc::new(AppConfigDataService::new(&sdk_config)));

    #[cfg(feature = "metrics")]
    let builder = builder.with_metrics(opentelemetry::global::meter("appconfig-sidecar"));

    let sidecar = builder
        .start(cancel.clone())
        .await
        .context("Failed to start configuration")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;

    let served = appconfig_sidecar::http::serve(listener, sidecar.config(), cancel.clone()).await;

    match sidecar.shutdown().await {
        PollerExit::Cancelled => info!("Shutdown complete"),
        exit => error!(?exit, "Poll loop did not stop cleanly"),
    }

    served.context("HTTP server error")
}

/// Cancel `cancel` on Ctrl-C or, on Unix, SIGTERM.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to listen for SIGTERM");
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

        info!("Shutdown signal received");
        cancel.cancel();
    });
}
