//! EVM JSON-RPC access and transaction signing.
//!
//! [`ChainBackend`] is the narrow surface the gateway needs from a node:
//! read-only calls, fee and nonce lookups, gas estimation, and a
//! sign-broadcast-confirm step. [`AlloyBackend`] implements it over HTTP
//! with a local private-key signer.

use std::time::Duration;

use alloy::{
    network::{Ethereum, EthereumWallet, ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::{
        reqwest::{Client, Url},
        Http,
    },
};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::errors::{OracleError, Result};

#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Address transactions are signed and sent from.
    fn signer_address(&self) -> Address;

    /// Read-only `eth_call` against `to`.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    async fn gas_price(&self) -> Result<u128>;

    async fn transaction_count(&self, address: Address) -> Result<u64>;

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64>;

    /// Sign `request`, broadcast it and block until its receipt is observed.
    async fn send_and_confirm(&self, request: TransactionRequest) -> Result<TxHash>;
}

#[derive(Debug)]
pub struct AlloyBackend {
    rpc_url: String,
    provider: DynProvider<Ethereum>,
    wallet: EthereumWallet,
    signer_address: Address,
    /// Fetched from the node on first use.
    chain_id: OnceCell<u64>,
}

impl AlloyBackend {
    /// Build a backend for `rpc_url`. The node is not contacted until the
    /// first request, so an unreachable node fails that request only.
    pub fn new(rpc_url: &str, private_key: &str, timeout: Duration) -> Result<Self> {
        let signer = signer_from_private_key(private_key)?;
        let signer_address = signer.address();

        let url: Url = rpc_url
            .parse()
            .map_err(|e| OracleError::Config(format!("Invalid AMOY_RPC_URL '{rpc_url}': {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Config(format!("Failed to build HTTP client: {e}")))?;

        let transport = Http::with_client(client, url);
        let rpc_client = RpcClient::new(transport, false);

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(rpc_client)
            .erased();

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            provider,
            wallet: EthereumWallet::from(signer),
            signer_address,
            chain_id: OnceCell::new(),
        })
    }

    async fn chain_id(&self) -> Result<u64> {
        self.chain_id
            .get_or_try_init(|| async {
                let chain_id = self.provider.get_chain_id().await.map_err(|e| {
                    OracleError::Rpc(format!("eth_chainId against {} failed: {e}", self.rpc_url))
                })?;
                info!(
                    chain_id,
                    oracle = %self.signer_address,
                    "Connected to chain node at {}", self.rpc_url
                );
                Ok::<_, OracleError>(chain_id)
            })
            .await
            .copied()
    }
}

#[async_trait]
impl ChainBackend for AlloyBackend {
    fn signer_address(&self) -> Address {
        self.signer_address
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.provider
            .call(request)
            .await
            .map_err(|e| OracleError::Rpc(format!("eth_call to {to} failed: {e}")))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| OracleError::Rpc(format!("eth_gasPrice failed: {e}")))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(|e| OracleError::Rpc(format!("eth_getTransactionCount failed: {e}")))
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(request.clone())
            .await
            .map_err(|e| OracleError::Rpc(format!("eth_estimateGas failed: {e}")))
    }

    async fn send_and_confirm(&self, request: TransactionRequest) -> Result<TxHash> {
        let chain_id = self.chain_id().await?;
        let envelope = request
            .with_chain_id(chain_id)
            .build(&self.wallet)
            .await
            .map_err(|e| OracleError::Signing(e.to_string()))?;

        let pending = self
            .provider
            .send_tx_envelope(envelope)
            .await
            .map_err(|e| OracleError::Rpc(format!("eth_sendRawTransaction failed: {e}")))?;

        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "Transaction broadcast, waiting for receipt");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| OracleError::Receipt(format!("{tx_hash}: {e}")))?;

        if !receipt.status() {
            warn!(
                %tx_hash,
                block = ?receipt.block_number,
                "Transaction was mined but reverted"
            );
        }

        Ok(receipt.transaction_hash)
    }
}

pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner> {
    private_key
        .trim()
        .parse()
        .map_err(|_| OracleError::InvalidPrivateKey {
            key_length: private_key.len(),
        })
}

pub fn parse_address(value: &str) -> Result<Address> {
    value
        .trim()
        .parse()
        .map_err(|e| OracleError::InvalidAddress {
            value: value.to_string(),
            reason: format!("{e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (account #0 of the default hardhat/anvil mnemonic).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn signer_address_derives_from_key() {
        let signer = signer_from_private_key(DEV_KEY).unwrap();
        assert_eq!(
            signer.address(),
            parse_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
    }

    #[test]
    fn key_without_prefix_is_accepted() {
        assert!(signer_from_private_key(DEV_KEY.trim_start_matches("0x")).is_ok());
    }

    #[test]
    fn malformed_key_is_rejected() {
        let err = signer_from_private_key("0x1234").unwrap_err();
        assert!(matches!(err, OracleError::InvalidPrivateKey { key_length: 6 }));
    }

    #[tokio::test]
    async fn backend_is_built_without_reaching_the_node() {
        let backend =
            AlloyBackend::new("http://127.0.0.1:1", DEV_KEY, Duration::from_secs(1)).unwrap();
        assert_eq!(
            backend.signer_address(),
            parse_address("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );

        let err = backend.gas_price().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn invalid_rpc_url_is_a_config_error() {
        let err = AlloyBackend::new("not a url", DEV_KEY, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, OracleError::Config(_)));
    }

    #[test]
    fn lowercase_address_parses() {
        assert!(parse_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").is_ok());
    }

    #[test]
    fn garbage_address_is_rejected() {
        assert!(matches!(
            parse_address("not-an-address"),
            Err(OracleError::InvalidAddress { .. })
        ));
    }
}
