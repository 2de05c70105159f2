//! In-memory chain backend and fixtures shared by the unit tests.

use std::sync::Mutex;

use alloy::{
    json_abi::JsonAbi,
    primitives::{address, b256, Address, Bytes, TxHash},
    rpc::types::TransactionRequest,
    sol,
    sol_types::SolValue,
};
use async_trait::async_trait;

use crate::errors::{OracleError, Result};
use crate::rpc::ChainBackend;

pub const REGISTRY_ADDRESS: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
pub const DAO_ADDRESS: Address = address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512");
pub const ORACLE_ADDRESS: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

sol! {
    interface RayanChainDao {
        function updateProposalRiskScore(uint256 proposalId, uint256 score) external;
        function updateParticipationScore(address user, uint256 score) external;
    }
}

pub const GOVERNANCE_ABI_JSON: &str = r#"[
  {
    "type": "function",
    "name": "updateProposalRiskScore",
    "inputs": [
      { "name": "proposalId", "type": "uint256", "internalType": "uint256" },
      { "name": "score", "type": "uint256", "internalType": "uint256" }
    ],
    "outputs": [],
    "stateMutability": "nonpayable"
  },
  {
    "type": "function",
    "name": "updateParticipationScore",
    "inputs": [
      { "name": "user", "type": "address", "internalType": "address" },
      { "name": "score", "type": "uint256", "internalType": "uint256" }
    ],
    "outputs": [],
    "stateMutability": "nonpayable"
  },
  {
    "type": "event",
    "name": "RiskScoreUpdated",
    "inputs": [
      { "name": "proposalId", "type": "uint256", "indexed": true, "internalType": "uint256" },
      { "name": "score", "type": "uint256", "indexed": false, "internalType": "uint256" }
    ],
    "anonymous": false
  }
]"#;

pub fn governance_abi() -> JsonAbi {
    serde_json::from_str(GOVERNANCE_ABI_JSON).expect("test ABI is valid")
}

#[derive(Default)]
struct Recorded {
    eth_calls: Vec<(Address, Bytes)>,
    lookups: usize,
    estimates: usize,
    send_attempts: usize,
    sent: Vec<TransactionRequest>,
}

/// Chain backend that answers from fixed values and records every request.
pub struct MockChain {
    dao_address: Address,
    gas_estimate: u64,
    fail_calls: bool,
    empty_call_results: bool,
    fail_lookups: bool,
    fail_estimates: bool,
    fail_sends: bool,
    recorded: Mutex<Recorded>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            dao_address: DAO_ADDRESS,
            gas_estimate: 60_000,
            fail_calls: false,
            empty_call_results: false,
            fail_lookups: false,
            fail_estimates: false,
            fail_sends: false,
            recorded: Mutex::new(Recorded::default()),
        }
    }
}

impl MockChain {
    pub const NONCE: u64 = 12;
    pub const GAS_PRICE: u128 = 30_000_000_000;
    pub const TX_HASH: TxHash =
        b256!("0x8f1f5b7c2d1f5e7a8c9d0e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d");

    pub fn with_dao_address(mut self, address: Address) -> Self {
        self.dao_address = address;
        self
    }

    pub fn with_gas_estimate(mut self, gas: u64) -> Self {
        self.gas_estimate = gas;
        self
    }

    pub fn failing_calls(mut self) -> Self {
        self.fail_calls = true;
        self
    }

    /// Answer every `eth_call` with `0x`, as a node does for an address
    /// without code.
    pub fn with_empty_call_results(mut self) -> Self {
        self.empty_call_results = true;
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn failing_estimates(mut self) -> Self {
        self.fail_estimates = true;
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn eth_calls(&self) -> Vec<(Address, Bytes)> {
        self.recorded.lock().unwrap().eth_calls.clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.recorded.lock().unwrap().sent.clone()
    }

    pub fn send_attempts(&self) -> usize {
        self.recorded.lock().unwrap().send_attempts
    }

    /// Every request that reached the backend, reads included.
    pub fn total_calls(&self) -> usize {
        let r = self.recorded.lock().unwrap();
        r.eth_calls.len() + r.lookups + r.estimates + r.send_attempts
    }
}

#[async_trait]
impl ChainBackend for MockChain {
    fn signer_address(&self) -> Address {
        ORACLE_ADDRESS
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.recorded.lock().unwrap().eth_calls.push((to, data));
        if self.fail_calls {
            return Err(OracleError::Rpc("execution reverted".into()));
        }
        if self.empty_call_results {
            return Ok(Bytes::new());
        }
        Ok(self.dao_address.abi_encode().into())
    }

    async fn gas_price(&self) -> Result<u128> {
        self.recorded.lock().unwrap().lookups += 1;
        if self.fail_lookups {
            return Err(OracleError::Rpc("connection refused".into()));
        }
        Ok(Self::GAS_PRICE)
    }

    async fn transaction_count(&self, _address: Address) -> Result<u64> {
        self.recorded.lock().unwrap().lookups += 1;
        if self.fail_lookups {
            return Err(OracleError::Rpc("connection refused".into()));
        }
        Ok(Self::NONCE)
    }

    async fn estimate_gas(&self, _request: &TransactionRequest) -> Result<u64> {
        self.recorded.lock().unwrap().estimates += 1;
        if self.fail_estimates {
            return Err(OracleError::Rpc("execution reverted".into()));
        }
        Ok(self.gas_estimate)
    }

    async fn send_and_confirm(&self, request: TransactionRequest) -> Result<TxHash> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.send_attempts += 1;
        if self.fail_sends {
            return Err(OracleError::Receipt("transaction dropped from mempool".into()));
        }
        recorded.sent.push(request);
        Ok(Self::TX_HASH)
    }
}
