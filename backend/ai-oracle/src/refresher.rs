//! Long-running background task that periodically republishes the admin
//! account's participation score.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::errors::OracleError;
use crate::oracle::{Oracle, ParticipationUpdate};
use crate::participation::UserHistory;
use crate::rpc::parse_address;

/// Activity profile scored on every tick until user histories are sourced
/// from chain data.
pub fn reference_history() -> UserHistory {
    UserHistory {
        num_votes_cast: 20,
        vote_accuracy_rate: 0.90,
        delegated_power: 10_000_000_000_000_000_000_000,
        inactivity_days: 1,
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    Skipped(&'static str),
    Published(ParticipationUpdate),
}

#[derive(Debug, Error)]
pub enum TickError {
    /// Logged; the loop carries on at the next interval.
    #[error("transient failure: {0}")]
    Transient(OracleError),
    /// Logged; the loop stops.
    #[error("fatal failure: {0}")]
    Fatal(OracleError),
}

impl From<OracleError> for TickError {
    fn from(err: OracleError) -> Self {
        if err.is_transient() {
            Self::Transient(err)
        } else {
            Self::Fatal(err)
        }
    }
}

pub struct ParticipationRefresher {
    oracle: Option<Arc<Oracle>>,
    admin_address: Option<String>,
    interval: Duration,
}

impl ParticipationRefresher {
    pub fn new(
        oracle: Option<Arc<Oracle>>,
        admin_address: Option<String>,
        interval: Duration,
    ) -> Self {
        Self {
            oracle,
            admin_address,
            interval,
        }
    }

    /// Perform a single refresh. Incomplete configuration is a skip, not an
    /// error, and never reaches the chain.
    pub async fn tick(&self) -> Result<TickOutcome, TickError> {
        let Some(oracle) = &self.oracle else {
            return Ok(TickOutcome::Skipped("oracle configuration incomplete"));
        };
        let Some(admin_address) = &self.admin_address else {
            return Ok(TickOutcome::Skipped("NEXT_PUBLIC_ADMIN_ADDRESS is not set"));
        };

        let user = parse_address(admin_address)?;
        info!("Updating PoP score for {user}...");

        let update = oracle
            .update_user_participation(user, &reference_history())
            .await?;
        Ok(TickOutcome::Published(update))
    }

    /// Run until `shutdown` is cancelled or a tick fails fatally.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "Starting continuous PoP update service (every {}s)",
            self.interval.as_secs()
        );

        loop {
            match self.tick().await {
                Ok(TickOutcome::Published(update)) => match update.tx_hash {
                    Some(tx_hash) => info!(
                        user = %update.user,
                        score = update.score,
                        %tx_hash,
                        "PoP score published"
                    ),
                    None => warn!(
                        user = %update.user,
                        score = update.score,
                        "PoP score computed but not submitted"
                    ),
                },
                Ok(TickOutcome::Skipped(reason)) => {
                    info!("Skipping PoP update: {reason}");
                }
                Err(TickError::Transient(e)) => {
                    error!("Error during continuous PoP update: {e}");
                }
                Err(TickError::Fatal(e)) => {
                    error!("PoP update cannot recover, stopping background task: {e}");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => {
                    info!("PoP update service shutting down");
                    break;
                }
            }
        }
    }
}
