//! Governance contract gateway.
//!
//! Resolves the DAO contract through the on-chain registry and submits
//! single-attempt, signed calls against it. Calldata is encoded from the
//! governance ABI supplied at startup, so the gateway can call any function
//! that ABI declares.

use std::sync::Arc;

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi},
    network::TransactionBuilder,
    primitives::{keccak256, Address, Bytes, TxHash, B256},
    rpc::types::TransactionRequest,
    sol,
    sol_types::SolCall,
};
use tracing::{error, info, warn};

use crate::errors::{OracleError, Result};
use crate::rpc::ChainBackend;

/// Gas limit used when `eth_estimateGas` fails.
pub const FALLBACK_GAS_LIMIT: u64 = 300_000;
/// Headroom added on top of every gas estimate.
pub const GAS_LIMIT_BUFFER: u64 = 50_000;

/// Registry key under which the governance contract is stored.
pub const DAO_REGISTRY_KEY: &str = "RAYAN_CHAIN_DAO";

sol! {
    interface DaoRegistry {
        function getAddress(bytes32 _key) external view returns (address);
    }
}

pub fn dao_registry_key() -> B256 {
    keccak256(DAO_REGISTRY_KEY.as_bytes())
}

/// Parse the governance ABI. Malformed JSON degrades to an empty ABI, which
/// turns every later submission into a logged no-op.
pub fn parse_governance_abi(json: &str) -> JsonAbi {
    match serde_json::from_str::<JsonAbi>(json) {
        Ok(abi) => abi,
        Err(e) => {
            warn!("Governance ABI is not valid JSON, falling back to an empty ABI: {e}");
            JsonAbi::new()
        }
    }
}

/// A fully specified contract call, ready to be signed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTransaction {
    pub function_name: String,
    pub to: Address,
    pub calldata: Bytes,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl PreparedTransaction {
    pub fn into_request(self, from: Address) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(from)
            .with_to(self.to)
            .with_input(self.calldata)
            .with_nonce(self.nonce)
            .with_gas_limit(self.gas_limit)
            .with_gas_price(self.gas_price)
    }
}

pub struct ChainGateway {
    backend: Arc<dyn ChainBackend>,
    abi: JsonAbi,
}

impl ChainGateway {
    pub fn new(backend: Arc<dyn ChainBackend>, abi: JsonAbi) -> Self {
        Self { backend, abi }
    }

    pub fn signer_address(&self) -> Address {
        self.backend.signer_address()
    }

    /// Look up the governance contract address in the registry.
    pub async fn resolve_contract_address(&self, registry: Address) -> Result<Address> {
        let call = DaoRegistry::getAddressCall {
            _key: dao_registry_key(),
        };
        let raw = self.backend.call(registry, call.abi_encode().into()).await?;

        let address = DaoRegistry::getAddressCall::abi_decode_returns(&raw).map_err(|e| {
            OracleError::RegistryResponse(format!("undecodable answer from {registry}: {e}"))
        })?;

        if address == Address::ZERO {
            return Err(OracleError::UnregisteredContract(DAO_REGISTRY_KEY.to_string()));
        }
        Ok(address)
    }

    /// Build, sign and send `function_name(args)` against `contract`, then
    /// wait for the receipt.
    ///
    /// Returns `None` without touching the chain when the governance ABI
    /// declares no functions. Gas estimation failures fall back to
    /// [`FALLBACK_GAS_LIMIT`]; every other failure is returned as is.
    pub async fn submit(
        &self,
        contract: Address,
        function_name: &str,
        args: &[String],
    ) -> Result<Option<TxHash>> {
        if self.abi.functions.is_empty() {
            error!("DAO ABI is missing. Cannot send on-chain transaction {function_name}");
            return Ok(None);
        }

        let calldata = self.encode_call(function_name, args)?;
        let from = self.backend.signer_address();

        let gas_price = self.backend.gas_price().await?;
        let nonce = self.backend.transaction_count(from).await?;

        let estimate_request = TransactionRequest::default()
            .with_from(from)
            .with_to(contract)
            .with_input(calldata.clone());
        let estimated_gas = match self.backend.estimate_gas(&estimate_request).await {
            Ok(gas) => gas,
            Err(e) => {
                warn!("Gas estimation failed for {function_name}: {e}");
                FALLBACK_GAS_LIMIT
            }
        };

        let prepared = PreparedTransaction {
            function_name: function_name.to_string(),
            to: contract,
            calldata,
            nonce,
            gas_limit: estimated_gas.saturating_add(GAS_LIMIT_BUFFER),
            gas_price,
        };

        info!(
            function = %prepared.function_name,
            nonce = prepared.nonce,
            gas_limit = prepared.gas_limit,
            gas_price = prepared.gas_price,
            "Sending transaction to {contract}"
        );

        let tx_hash = self
            .backend
            .send_and_confirm(prepared.into_request(from))
            .await?;

        info!(%tx_hash, "Transaction confirmed: {function_name}");
        Ok(Some(tx_hash))
    }

    /// ABI-encode a call, coercing each string argument into the type the
    /// ABI declares for it.
    pub fn encode_call(&self, function_name: &str, args: &[String]) -> Result<Bytes> {
        let function = self.find_function(function_name, args.len())?;

        let values = function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve().map_err(|e| {
                    OracleError::Abi(format!("Unsupported parameter type '{}': {e}", param.ty))
                })?;
                ty.coerce_str(arg).map_err(|e| {
                    OracleError::Abi(format!(
                        "Argument '{arg}' is not a valid {} for {function_name}: {e}",
                        param.ty
                    ))
                })
            })
            .collect::<Result<Vec<DynSolValue>>>()?;

        function
            .abi_encode_input(&values)
            .map(Bytes::from)
            .map_err(|e| OracleError::Abi(format!("Failed to encode {function_name}: {e}")))
    }

    fn find_function(&self, name: &str, arity: usize) -> Result<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
            .ok_or_else(|| OracleError::UnknownFunction(name.to_string()))
    }
}
