//! Oracle façade: compute a score, then publish it on chain.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use tracing::info;

use crate::config::OracleSettings;
use crate::errors::Result;
use crate::gateway::{parse_governance_abi, ChainGateway};
use crate::participation::{calculate_participation_score, UserHistory};
use crate::risk::{analyze_risk, parse_milestone_amounts, ProjectFeatures, RiskAssessment};
use crate::rpc::{parse_address, AlloyBackend};

pub const UPDATE_RISK_FUNCTION: &str = "updateProposalRiskScore";
pub const UPDATE_PARTICIPATION_FUNCTION: &str = "updateParticipationScore";

#[derive(Debug, Clone, PartialEq)]
pub struct RiskUpdate {
    pub proposal_id: u64,
    pub assessment: RiskAssessment,
    /// `None` when the submission was skipped.
    pub tx_hash: Option<TxHash>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationUpdate {
    pub user: Address,
    pub score: u16,
    /// `None` when the submission was skipped.
    pub tx_hash: Option<TxHash>,
}

pub struct Oracle {
    gateway: ChainGateway,
    registry: Address,
}

impl Oracle {
    pub fn new(gateway: ChainGateway, registry: Address) -> Self {
        Self { gateway, registry }
    }

    /// Build the oracle described by `settings`. Only malformed settings
    /// fail here; the node is first contacted by an update.
    pub fn from_settings(settings: &OracleSettings) -> Result<Self> {
        let registry = parse_address(&settings.registry_address)?;
        let backend =
            AlloyBackend::new(&settings.rpc_url, &settings.private_key, settings.rpc_timeout)?;
        let gateway = ChainGateway::new(Arc::new(backend), parse_governance_abi(&settings.dao_abi));
        Ok(Self::new(gateway, registry))
    }

    pub fn signer_address(&self) -> Address {
        self.gateway.signer_address()
    }

    /// Score a proposal and publish its risk score. The confidence score is
    /// logged but not sent.
    pub async fn update_proposal_risk<S: AsRef<str>>(
        &self,
        proposal_id: u64,
        features: &ProjectFeatures,
        milestone_amounts: &[S],
    ) -> Result<RiskUpdate> {
        let dao = self.gateway.resolve_contract_address(self.registry).await?;

        let amounts = parse_milestone_amounts(milestone_amounts)?;
        let assessment = analyze_risk(features, &amounts);
        info!(
            "Proposal {proposal_id} Risk: {}, Confidence: {}",
            assessment.risk_score, assessment.confidence_score
        );

        let tx_hash = self
            .gateway
            .submit(
                dao,
                UPDATE_RISK_FUNCTION,
                &[proposal_id.to_string(), assessment.risk_score.to_string()],
            )
            .await?;

        Ok(RiskUpdate {
            proposal_id,
            assessment,
            tx_hash,
        })
    }

    /// Score a user and publish their participation score.
    pub async fn update_user_participation(
        &self,
        user: Address,
        history: &UserHistory,
    ) -> Result<ParticipationUpdate> {
        let dao = self.gateway.resolve_contract_address(self.registry).await?;

        let user_str = user.to_string();
        let score = calculate_participation_score(&user_str, history);
        info!("User {user_str} PoP Score: {score}");

        let tx_hash = self
            .gateway
            .submit(
                dao,
                UPDATE_PARTICIPATION_FUNCTION,
                &[user_str, score.to_string()],
            )
            .await?;

        Ok(ParticipationUpdate {
            user,
            score,
            tx_hash,
        })
    }
}
