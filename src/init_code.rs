// src/init_code.rs
use std::sync::Arc;

use ethers::abi::AbiEncode;
use ethers::providers::Middleware;
use ethers::types::{Address, Bytes, U256};
use tracing::debug;

use crate::contracts::simple_account_factory::{CreateAccountCall, SimpleAccountFactory};
use crate::error::UserOpError;

/// SimpleAccountFactory used for the counterfactual wallet.
pub const SIMPLE_ACCOUNT_FACTORY: &str = "0x61e218301932a2550AE8E4Cd1EcfCA7bE64E57DC";

/// Every wallet in this run is created with salt zero.
pub const WALLET_SALT: u64 = 0;

/// Builds `factory ‖ createAccount(owner, 0)`, the payload the EntryPoint hands
/// to the factory to deploy the wallet on first use.
pub fn build_init_code(factory: Address, owner: Address) -> Bytes {
    let call = CreateAccountCall {
        owner,
        salt: U256::from(WALLET_SALT),
    };

    let mut init_code = Vec::with_capacity(20 + 4 + 64);
    init_code.extend_from_slice(factory.as_bytes());
    init_code.extend_from_slice(&call.encode());

    Bytes::from(init_code)
}

/// Asks the factory for the address `createAccount(owner, 0)` would deploy to.
pub async fn resolve_sender<M: Middleware + 'static>(
    client: Arc<M>,
    factory: Address,
    owner: Address,
) -> Result<Address, UserOpError> {
    let factory = SimpleAccountFactory::new(factory, client);
    let sender = factory
        .get_address(owner, U256::from(WALLET_SALT))
        .call()
        .await
        .map_err(|e| UserOpError::Provider(e.to_string()))?;

    debug!("Factory resolved owner {:?} to sender {:?}", owner, sender);

    Ok(sender)
}
