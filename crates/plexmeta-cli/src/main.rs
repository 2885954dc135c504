use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use plexmeta_api::plex::PlexClient;
use plexmeta_core::config::AppConfig;
use plexmeta_core::error::PlexmetaError;
use plexmeta_core::orchestrator::{PassReport, Reconciler};
use plexmeta_core::overrides::OverrideLoader;

/// Reconcile Plex season and episode titles with folder and file names.
#[derive(Parser, Debug)]
#[command(name = "plexmeta")]
#[command(version)]
struct Args {
    /// Config file (defaults to the per-user config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Plex server address, e.g. http://localhost:32400
    #[arg(long, env = "PLEXMETA_SERVER")]
    server: Option<String>,

    /// Plex auth token
    #[arg(long, env = "PLEXMETA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Library to reconcile
    #[arg(short, long, env = "PLEXMETA_LIBRARY")]
    library: Option<String>,

    /// Compute changes without sending them
    #[arg(long)]
    dry_run: bool,

    /// Send updates even when the server already matches
    #[arg(long)]
    always_modify: bool,

    /// Debug logging (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(server) = &self.server {
            config.server.address = server.clone();
        }
        if let Some(token) = &self.token {
            config.server.auth_token = token.clone();
        }
        if let Some(library) = &self.library {
            config.library.name = library.clone();
        }
        config.reconcile.dry_run |= self.dry_run;
        config.reconcile.always_modify |= self.always_modify;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "info,plexmeta_cli=debug,plexmeta_core=debug,plexmeta_api=debug,plexmeta_parse=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match run(args).await {
        Ok(report) if report.cancelled => ExitCode::from(130),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Reconciliation aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<PassReport, PlexmetaError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    args.apply(&mut config);
    config.validate()?;

    let client = PlexClient::new(
        &config.server.address,
        &config.server.auth_token,
        &config.library.required_agent,
    )
    .map_err(|e| PlexmetaError::Config(e.to_string()))?;
    let loader = OverrideLoader::new(&config.overrides);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    info!(
        server = %config.server.address,
        library = %config.library.name,
        dry_run = config.reconcile.dry_run,
        "Starting reconciliation"
    );
    Reconciler::new(client, loader, config.reconcile_options())
        .with_cancellation(cancel)
        .run(&config.library.name)
        .await
}

/// Cancel the pass on Ctrl+C or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, stopping after the current operation"),
        _ = terminate => info!("Received terminate signal, stopping after the current operation"),
    }
    cancel.cancel();
}
