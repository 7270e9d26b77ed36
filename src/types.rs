// src/types.rs
use std::fmt;
use std::ops::Deref;

use ethers::abi::AbiEncode;
use ethers::prelude::{EthAbiCodec, EthAbiType};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::contracts::entry_point;

/// Length of a signed operation's `signature`: r (32) ‖ s (32) ‖ v (1).
pub const SIGNATURE_LEN: usize = 65;

/// ERC-4337 user operation in the EntryPoint v0.6 layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl UserOperation {
    /// ABI-encodes every field except the signature, with the dynamic byte
    /// fields replaced by their Keccak-256 digests.
    pub fn pack_for_signature(&self) -> Bytes {
        UserOperationPacked::from(self).encode().into()
    }

    /// Hash that binds the operation to one EntryPoint deployment on one chain.
    pub fn hash(&self, entry_point: &Address, chain_id: u64) -> UserOperationHash {
        let inner = keccak256(self.pack_for_signature().deref());
        let outer = keccak256(
            [
                inner.to_vec(),
                entry_point.encode(),
                U256::from(chain_id).encode(),
            ]
            .concat(),
        );
        UserOperationHash(H256::from(outer))
    }

    pub fn is_signed(&self) -> bool {
        self.signature.len() == SIGNATURE_LEN
    }
}

impl From<UserOperation> for entry_point::UserOperation {
    fn from(op: UserOperation) -> Self {
        Self {
            sender: op.sender,
            nonce: op.nonce,
            init_code: op.init_code,
            call_data: op.call_data,
            call_gas_limit: op.call_gas_limit,
            verification_gas_limit: op.verification_gas_limit,
            pre_verification_gas: op.pre_verification_gas,
            max_fee_per_gas: op.max_fee_per_gas,
            max_priority_fee_per_gas: op.max_priority_fee_per_gas,
            paymaster_and_data: op.paymaster_and_data,
            signature: op.signature,
        }
    }
}

#[derive(EthAbiCodec, EthAbiType)]
struct UserOperationPacked {
    sender: Address,
    nonce: U256,
    init_code: H256,
    call_data: H256,
    call_gas_limit: U256,
    verification_gas_limit: U256,
    pre_verification_gas: U256,
    max_fee_per_gas: U256,
    max_priority_fee_per_gas: U256,
    paymaster_and_data: H256,
}

impl From<&UserOperation> for UserOperationPacked {
    fn from(op: &UserOperation) -> Self {
        Self {
            sender: op.sender,
            nonce: op.nonce,
            init_code: keccak256(op.init_code.deref()).into(),
            call_data: keccak256(op.call_data.deref()).into(),
            call_gas_limit: op.call_gas_limit,
            verification_gas_limit: op.verification_gas_limit,
            pre_verification_gas: op.pre_verification_gas,
            max_fee_per_gas: op.max_fee_per_gas,
            max_priority_fee_per_gas: op.max_priority_fee_per_gas,
            paymaster_and_data: keccak256(op.paymaster_and_data.deref()).into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserOperationHash(pub H256);

impl UserOperationHash {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for UserOperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: P,
}

impl<P: Serialize> JsonRpcRequest<P> {
    pub fn new(method: &'static str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

/// Transaction handed to `tenderly_simulateTransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationResponse {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub jsonrpc: String,
    pub result: SimulationStatus,
}

impl SimulationResponse {
    pub fn success(&self) -> bool {
        self.result.status
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationStatus {
    pub status: bool,
}

/// Body returned by the simulation endpoint on a non-200 status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: RemoteError,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteError {
    pub id: String,
    pub slug: String,
    pub message: String,
}
