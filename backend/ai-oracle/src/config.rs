//! Application configuration loaded from environment variables.

use std::time::Duration;

use crate::errors::{OracleError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint of the chain node (e.g. a Polygon Amoy RPC URL)
    pub rpc_url: String,
    /// Hex-encoded private key the oracle signs transactions with
    pub oracle_private_key: Option<String>,
    /// Address of the DAO registry contract
    pub registry_address: Option<String>,
    /// Governance contract ABI as JSON text
    pub dao_abi: String,
    /// Address whose participation score the background task refreshes
    pub admin_address: Option<String>,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) the background task republishes the PoP score
    pub pop_update_interval_secs: u64,
    /// Per-request timeout of the RPC HTTP client
    pub rpc_timeout_secs: u64,
}

/// The subset of [`Config`] the chain-dependent modules need.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub rpc_url: String,
    pub private_key: String,
    pub registry_address: String,
    pub dao_abi: String,
    pub rpc_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            rpc_url: var("AMOY_RPC_URL").ok_or_else(|| {
                OracleError::Config("AMOY_RPC_URL environment variable is required".to_string())
            })?,
            oracle_private_key: var("AI_ORACLE_PRIVATE_KEY"),
            registry_address: var("NEXT_PUBLIC_REGISTRY_ADDRESS"),
            dao_abi: var("RAYAN_CHAIN_DAO_ABI").unwrap_or_else(|| "[]".to_string()),
            admin_address: var("NEXT_PUBLIC_ADMIN_ADDRESS"),
            api_port: var("API_PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse()
                .map_err(|_| OracleError::Config("Invalid API_PORT".to_string()))?,
            pop_update_interval_secs: var("POP_UPDATE_INTERVAL_SECS")
                .unwrap_or_else(|| "300".to_string())
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| OracleError::Config("Invalid POP_UPDATE_INTERVAL_SECS".to_string()))?,
            rpc_timeout_secs: var("RPC_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| OracleError::Config("Invalid RPC_TIMEOUT_SECS".to_string()))?,
        })
    }

    /// Settings for the chain gateway. Fails when the signing key or the
    /// registry address is missing.
    pub fn oracle_settings(&self) -> Result<OracleSettings> {
        let missing = [
            ("AI_ORACLE_PRIVATE_KEY", self.oracle_private_key.is_none()),
            ("NEXT_PUBLIC_REGISTRY_ADDRESS", self.registry_address.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect::<Vec<_>>();

        match (&self.oracle_private_key, &self.registry_address) {
            (Some(private_key), Some(registry_address)) => Ok(OracleSettings {
                rpc_url: self.rpc_url.clone(),
                private_key: private_key.clone(),
                registry_address: registry_address.clone(),
                dao_abi: self.dao_abi.clone(),
                rpc_timeout: Duration::from_secs(self.rpc_timeout_secs),
            }),
            _ => Err(OracleError::Config(format!(
                "Missing AI oracle configuration: {}",
                missing.join(", ")
            ))),
        }
    }

    pub fn pop_update_interval(&self) -> Duration {
        Duration::from_secs(self.pop_update_interval_secs)
    }
}
