//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("Invalid oracle private key (length {key_length})")]
    InvalidPrivateKey { key_length: usize },

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Function '{0}' is not part of the governance ABI")]
    UnknownFunction(String),

    #[error("Registry has no contract registered under '{0}'")]
    UnregisteredContract(String),

    #[error("Unexpected registry response: {0}")]
    RegistryResponse(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Receipt error: {0}")]
    Receipt(String),

    #[error("Invalid milestone amount '{0}'")]
    InvalidMilestoneAmount(String),
}

impl OracleError {
    /// Failures that may heal on their own: node hiccups, a transaction that
    /// never confirmed, or a registry that is not deployed or populated yet.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Rpc(_)
                | Self::Receipt(_)
                | Self::RegistryResponse(_)
                | Self::UnregisteredContract(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OracleError>;
