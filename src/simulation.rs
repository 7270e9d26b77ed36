// src/simulation.rs
use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes};
use ethers::utils::to_checksum;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::contracts::entry_point::HandleOpsCall;
use crate::error::UserOpError;
use crate::types::{
    ErrorEnvelope, JsonRpcRequest, SimulationRequest, SimulationResponse, UserOperation,
};

/// EntryPoint v0.6.
pub const ENTRY_POINT_ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";

/// Receives the `handleOps` compensation in the simulated bundle.
pub const BENEFICIARY_ADDRESS: &str = "0xa4bfe126d3ad137f972695dddb1780a29065e556";

pub const SIMULATE_METHOD: &str = "tenderly_simulateTransaction";

pub const SIMULATION_BLOCK: &str = "latest";

/// Dry-runs `handleOps` for a signed operation against a Tenderly endpoint.
pub struct SimulationClient {
    http: reqwest::Client,
    rpc_url: String,
    entry_point: Address,
    beneficiary: Address,
}

impl SimulationClient {
    pub fn new(
        http: reqwest::Client,
        rpc_url: impl Into<String>,
        entry_point: Address,
        beneficiary: Address,
    ) -> Self {
        Self {
            http,
            rpc_url: rpc_url.into(),
            entry_point,
            beneficiary,
        }
    }

    /// `handleOps([user_op], beneficiary)` calldata.
    pub fn handle_ops_calldata(&self, user_op: &UserOperation) -> Bytes {
        HandleOpsCall {
            ops: vec![user_op.clone().into()],
            beneficiary: self.beneficiary,
        }
        .encode()
        .into()
    }

    pub fn request(
        &self,
        user_op: &UserOperation,
    ) -> JsonRpcRequest<(SimulationRequest, &'static str)> {
        let transaction = SimulationRequest {
            from: to_checksum(&user_op.sender, None),
            to: to_checksum(&self.entry_point, None),
            data: format!("0x{}", hex::encode(self.handle_ops_calldata(user_op))),
        };

        JsonRpcRequest::new(SIMULATE_METHOD, (transaction, SIMULATION_BLOCK))
    }

    pub async fn simulate(&self, user_op: &UserOperation) -> Result<SimulationResponse, UserOpError> {
        let request = self.request(user_op);
        debug!("Simulating handleOps for sender {:?}", user_op.sender);

        let response = self
            .http
            .post(&self.rpc_url)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        let simulated = parse_simulation_response(status, &body)?;
        debug!(
            "Simulation response id {} ({})",
            simulated.id, simulated.jsonrpc
        );
        info!("Simulation of handleOps for {:?} succeeded", user_op.sender);

        Ok(simulated)
    }
}

/// Maps a raw simulator reply onto the failure taxonomy.
///
/// Anything above 200 carries an `{error: {message}}` envelope. A 200 carries
/// `{result: {status}}`, where `false` means the EntryPoint reverted; the
/// revert reason is not part of this reply.
pub fn parse_simulation_response(
    status: StatusCode,
    body: &[u8],
) -> Result<SimulationResponse, UserOpError> {
    if status.as_u16() > StatusCode::OK.as_u16() {
        let envelope: ErrorEnvelope = serde_json::from_slice(body)?;
        debug!(
            "Simulator returned {} (id: {}, slug: {})",
            status, envelope.error.id, envelope.error.slug
        );
        return Err(UserOpError::Remote(envelope.error.message));
    }

    let response: SimulationResponse = serde_json::from_slice(body)?;
    if !response.success() {
        return Err(UserOpError::Reverted);
    }

    Ok(response)
}
