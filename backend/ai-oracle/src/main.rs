//! AI Oracle service entry point.
//!
//! Serves a small Axum API and runs a background task that periodically
//! recomputes a participation score and publishes it to the governance
//! contract. `mock-run` performs one risk update and one participation
//! update against the configured chain, then exits.

mod api;
mod config;
mod errors;
mod gateway;
mod oracle;
mod participation;
mod refresher;
mod risk;
mod rpc;
#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use oracle::Oracle;
use participation::UserHistory;
use refresher::ParticipationRefresher;
use risk::ProjectFeatures;

const REFRESHER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "ai-oracle", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API and the background PoP refresher (default).
    Serve,
    /// Publish one sample risk score and one sample PoP score, then exit.
    MockRun {
        #[arg(long, default_value_t = 1)]
        proposal_id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load optional .env file (ignored if missing) so RUST_LOG can live there too.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::MockRun { proposal_id } => mock_run(config, proposal_id).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // ─── Chain-dependent modules ──────────────────────────
    let oracle = match build_oracle(&config) {
        Ok(oracle) => {
            info!("AI oracle signing as {}", oracle.signer_address());
            Some(Arc::new(oracle))
        }
        Err(e) => {
            warn!("AI oracle disabled: {e}");
            None
        }
    };

    // ─── Background refresher ─────────────────────────────
    let shutdown = CancellationToken::new();
    let refresher = ParticipationRefresher::new(
        oracle,
        config.admin_address.clone(),
        config.pop_update_interval(),
    );
    let mut refresher_handle = tokio::spawn(refresher.run(shutdown.clone()));
    info!("Background PoP task created");

    // ─── REST API ─────────────────────────────────────────
    let app = api::router();

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    match tokio::time::timeout(REFRESHER_SHUTDOWN_TIMEOUT, &mut refresher_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Background PoP task panicked: {e}"),
        Err(_) => {
            warn!(
                timeout_secs = REFRESHER_SHUTDOWN_TIMEOUT.as_secs(),
                "Background PoP task did not stop in time, aborting"
            );
            refresher_handle.abort();
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn mock_run(config: Config, proposal_id: u64) -> anyhow::Result<()> {
    info!("--- AI Oracle mock run ---");
    let oracle = build_oracle(&config).map_err(|e| anyhow::anyhow!("{e}"))?;

    let features = ProjectFeatures {
        startup_industry: Some("Deep Tech AI".to_string()),
        team_experience: Some("Ex-FAANG with 10+ years.".to_string()),
        ..Default::default()
    };
    let risk = oracle
        .update_proposal_risk(proposal_id, &features, &["500000", "500000", "1000000"])
        .await?;
    info!(?risk, "Risk update finished");

    let history = UserHistory {
        num_votes_cast: 15,
        vote_accuracy_rate: 0.85,
        delegated_power: 50_000_000_000_000_000_000_000,
        inactivity_days: 10,
    };
    let participation = oracle
        .update_user_participation(oracle.signer_address(), &history)
        .await?;
    info!(?participation, "Participation update finished");

    Ok(())
}

fn build_oracle(config: &Config) -> errors::Result<Oracle> {
    let settings = config.oracle_settings()?;
    Oracle::from_settings(&settings)
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Shutting down gracefully..."),
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {e}");
                shutdown.cancelled().await;
            }
        },
        _ = shutdown.cancelled() => {}
    }
}
