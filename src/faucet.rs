// src/faucet.rs
use ethers::types::Address;
use ethers::utils::to_checksum;
use reqwest::header::ACCEPT;
use tracing::{info, warn};

use crate::error::UserOpError;
use crate::types::JsonRpcRequest;

pub const SET_BALANCE_METHOD: &str = "tenderly_setBalance";

/// 1 ether in wei.
pub const FUNDED_BALANCE: &str = "0xDE0B6B3A7640000";

/// Tops up accounts on a Tenderly fork through `tenderly_setBalance`.
pub struct Faucet {
    http: reqwest::Client,
    rpc_url: String,
}

impl Faucet {
    pub fn new(http: reqwest::Client, rpc_url: impl Into<String>) -> Self {
        Self {
            http,
            rpc_url: rpc_url.into(),
        }
    }

    pub fn request(account: Address) -> JsonRpcRequest<(Vec<String>, &'static str)> {
        JsonRpcRequest::new(
            SET_BALANCE_METHOD,
            (vec![to_checksum(&account, None)], FUNDED_BALANCE),
        )
    }

    /// Sets the balance of `account`. Only the HTTP round trip is checked; the
    /// response body is not inspected.
    pub async fn fund(&self, account: Address) -> Result<(), UserOpError> {
        let response = self
            .http
            .post(&self.rpc_url)
            .header(ACCEPT, "application/json")
            .json(&Self::request(account))
            .send()
            .await?;

        if response.status().is_success() {
            info!("Funded {:?} with {} wei", account, FUNDED_BALANCE);
        } else {
            warn!(
                "Faucet answered {} while funding {:?}",
                response.status(),
                account
            );
        }

        Ok(())
    }
}
