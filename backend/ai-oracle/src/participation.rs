//! Proof-of-Participation (PoP) model.
//!
//! Scores a governance voter on a 0-1000 scale from their voting volume,
//! voting accuracy, delegated stake and inactivity.

use serde::Deserialize;
use tracing::debug;

const VOLUME_POINTS_PER_VOTE: u64 = 100;
const MAX_VOLUME_POINTS: u64 = 500;
const MAX_QUALITY_POINTS: f64 = 300.0;
const MAX_REPUTATION_POINTS: i64 = 200;
/// Delegated stake (in whole tokens) that earns the full reputation score.
const FULL_REPUTATION_STAKE: f64 = 100_000.0;
const WEI_PER_TOKEN: f64 = 1e18;
const PENALTY_POINTS_PER_IDLE_DAY: u64 = 5;
const MAX_INACTIVITY_PENALTY: u64 = 200;

pub const MAX_PARTICIPATION_SCORE: u16 = 1000;

/// Historical governance activity of a single user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserHistory {
    #[serde(default)]
    pub num_votes_cast: u64,
    /// Share of the user's votes that landed on successful proposals.
    #[serde(default = "default_accuracy")]
    pub vote_accuracy_rate: f64,
    /// Delegated voting power, in wei.
    #[serde(default)]
    pub delegated_power: u128,
    #[serde(default, alias = "time_since_last_vote_days")]
    pub inactivity_days: u64,
}

fn default_accuracy() -> f64 {
    0.5
}

impl Default for UserHistory {
    fn default() -> Self {
        Self {
            num_votes_cast: 0,
            vote_accuracy_rate: default_accuracy(),
            delegated_power: 0,
            inactivity_days: 0,
        }
    }
}

pub fn calculate_participation_score(user_address: &str, history: &UserHistory) -> u16 {
    let volume = history
        .num_votes_cast
        .saturating_mul(VOLUME_POINTS_PER_VOTE)
        .min(MAX_VOLUME_POINTS) as i64;

    let accuracy = if history.vote_accuracy_rate.is_nan() {
        0.0
    } else {
        history.vote_accuracy_rate.clamp(0.0, 1.0)
    };
    let quality = (accuracy * MAX_QUALITY_POINTS) as i64;

    let stake_tokens = history.delegated_power as f64 / WEI_PER_TOKEN;
    let reputation =
        ((stake_tokens / FULL_REPUTATION_STAKE * 200.0) as i64).min(MAX_REPUTATION_POINTS);

    let penalty = history
        .inactivity_days
        .saturating_mul(PENALTY_POINTS_PER_IDLE_DAY)
        .min(MAX_INACTIVITY_PENALTY) as i64;

    let score = (volume + quality + reputation - penalty)
        .clamp(0, i64::from(MAX_PARTICIPATION_SCORE)) as u16;

    debug!(
        user = user_address,
        volume, quality, reputation, penalty, score, "Computed participation score"
    );
    score
}
