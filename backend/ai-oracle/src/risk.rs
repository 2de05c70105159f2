//! Project risk model.
//!
//! Turns a proposal's descriptive features and milestone funding amounts into
//! a risk score (0-100) and a confidence score (0-100).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{OracleError, Result};

const INDUSTRY_WEIGHT: f64 = 0.2;
const EXPERIENCE_WEIGHT: f64 = 0.4;
const MILESTONE_COUNT_WEIGHT: f64 = 0.1;
const TOTAL_AMOUNT_WEIGHT: f64 = 0.3;

const TECH_INDUSTRY_RISK: u8 = 50;
const PHARMA_INDUSTRY_RISK: u8 = 30;

/// Teams described in more words than this count as experienced.
const EXPERIENCED_TEAM_MIN_WORDS: usize = 10;
const EXPERIENCED_TEAM_SCORE: u8 = 80;
const INEXPERIENCED_TEAM_SCORE: u8 = 30;

const HIGH_CONFIDENCE: u8 = 90;
const LOW_CONFIDENCE: u8 = 30;

pub const MAX_RISK_SCORE: u8 = 100;

/// Descriptive attributes of a funding proposal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFeatures {
    pub startup_industry: Option<String>,
    pub team_experience: Option<String>,
    /// Attributes the model does not read.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub confidence_score: u8,
}

/// Parse milestone funding amounts given as numeric strings.
pub fn parse_milestone_amounts<S: AsRef<str>>(amounts: &[S]) -> Result<Vec<f64>> {
    amounts
        .iter()
        .map(|raw| {
            let raw = raw.as_ref();
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| OracleError::InvalidMilestoneAmount(raw.to_string()))
        })
        .collect()
}

pub fn analyze_risk(features: &ProjectFeatures, milestone_amounts: &[f64]) -> RiskAssessment {
    let industry_risk = industry_risk(features.startup_industry.as_deref().unwrap_or_default());
    let experience_score =
        experience_score(features.team_experience.as_deref().unwrap_or_default());
    let total_amount: f64 = milestone_amounts.iter().sum();

    let mut weighted_risk = f64::from(100 - experience_score) * EXPERIENCE_WEIGHT;
    weighted_risk += f64::from(industry_risk) * INDUSTRY_WEIGHT;

    let weight_sum = [
        INDUSTRY_WEIGHT,
        EXPERIENCE_WEIGHT,
        MILESTONE_COUNT_WEIGHT,
        TOTAL_AMOUNT_WEIGHT,
    ]
    .iter()
    .sum::<f64>();

    // Truncate first, then clamp; `as` saturates on overflow and maps NaN to 0.
    let raw_risk = ((weighted_risk + (total_amount / 1_000_000.0) * 10.0) / weight_sum) as i64;
    let risk_score = raw_risk.clamp(0, i64::from(MAX_RISK_SCORE)) as u8;

    let confidence_score = match features.team_experience.as_deref() {
        Some(text) if !text.is_empty() => HIGH_CONFIDENCE,
        _ => LOW_CONFIDENCE,
    };

    RiskAssessment {
        risk_score,
        confidence_score,
    }
}

fn industry_risk(industry: &str) -> u8 {
    let industry = industry.to_lowercase();
    if industry.contains("tech") {
        TECH_INDUSTRY_RISK
    } else if industry.contains("pharma") {
        PHARMA_INDUSTRY_RISK
    } else {
        0
    }
}

fn experience_score(experience: &str) -> u8 {
    if experience.split_whitespace().count() > EXPERIENCED_TEAM_MIN_WORDS {
        EXPERIENCED_TEAM_SCORE
    } else {
        INEXPERIENCED_TEAM_SCORE
    }
}
