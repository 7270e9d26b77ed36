// src/main.rs
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, Bytes, U256};
use reqwest::Url;
use tracing::level_filters::LevelFilter;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod contracts;
mod error;
mod faucet;
mod init_code;
mod signer;
mod simulation;
mod types;
mod wallet;

use crate::error::UserOpError;
use crate::faucet::Faucet;
use crate::init_code::{build_init_code, resolve_sender, SIMPLE_ACCOUNT_FACTORY};
use crate::signer::{recover_signer, sign_user_operation};
use crate::simulation::{SimulationClient, BENEFICIARY_ADDRESS, ENTRY_POINT_ADDRESS};
use crate::types::UserOperation;
use crate::wallet::KeyPair;

const CALL_GAS_LIMIT: u64 = 200_000;
const VERIFICATION_GAS_LIMIT: u64 = 500_000;
const PRE_VERIFICATION_GAS: u64 = 500_000;
const MAX_FEE_PER_GAS: u64 = 200_000;
const MAX_PRIORITY_FEE_PER_GAS: u64 = 200_000;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Deploys, signs and dry-runs one ERC-4337 user operation", long_about = None)]
struct Args {
    #[clap(long, env = "CHAIN_ID")]
    chain_id: u64,

    /// Tenderly fork endpoint, used for eth_call, funding and simulation
    #[clap(long, env = "ETH_RPC_URL")]
    eth_rpc_url: String,

    #[clap(long, default_value = ENTRY_POINT_ADDRESS)]
    entry_point: Address,

    #[clap(long, default_value = SIMPLE_ACCOUNT_FACTORY)]
    factory: Address,

    #[clap(long, default_value = BENEFICIARY_ADDRESS)]
    beneficiary: Address,

    #[clap(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Skip tenderly_setBalance, e.g. when the sender is already funded
    #[clap(long)]
    skip_funding: bool,
}

impl Args {
    fn rpc_url(&self) -> Result<Url, UserOpError> {
        if self.eth_rpc_url.trim().is_empty() {
            return Err(UserOpError::Config("please provide a valid RPC url".to_string()));
        }

        Url::parse(&self.eth_rpc_url).map_err(|e| UserOpError::Config(format!("ETH_RPC_URL: {e}")))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    run(args).await
}

async fn run(args: Args) -> anyhow::Result<()> {
    let rpc_url = args.rpc_url()?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;
    let provider = Arc::new(Provider::new(Http::new_with_client(
        rpc_url.clone(),
        http.clone(),
    )));

    // dropped at the end of this scope on every path, zeroing the secret
    let owner = KeyPair::generate();
    info!("Generated owner key with address: {:?}", owner.address());

    let sender = resolve_sender(provider, args.factory, owner.address()).await?;
    info!("Counterfactual wallet address: {:?}", sender);

    let user_op = build_user_operation(sender, build_init_code(args.factory, owner.address()));
    let user_op = sign_user_operation(&owner, user_op, args.entry_point, args.chain_id)?;
    info!(
        "Signed user operation {}",
        user_op.hash(&args.entry_point, args.chain_id)
    );

    let recovered = recover_signer(&user_op, args.entry_point, args.chain_id)?;
    if recovered != owner.address() {
        return Err(UserOpError::Crypto(format!(
            "signature recovers to {recovered:?}, expected {:?}",
            owner.address()
        ))
        .into());
    }

    if args.skip_funding {
        info!("Skipping faucet funding for {:?}", sender);
    } else {
        Faucet::new(http.clone(), rpc_url.as_str()).fund(sender).await?;
    }

    let simulator =
        SimulationClient::new(http, rpc_url.as_str(), args.entry_point, args.beneficiary);
    let result = simulator.simulate(&user_op).await?;
    info!("EntryPoint accepted the operation (status: {})", result.success());

    Ok(())
}

/// Deployment-only operation: nonce zero, no call data, fixed gas bounds.
fn build_user_operation(sender: Address, init_code: Bytes) -> UserOperation {
    UserOperation {
        sender,
        nonce: U256::zero(),
        init_code,
        call_data: Bytes::default(),
        call_gas_limit: U256::from(CALL_GAS_LIMIT),
        verification_gas_limit: U256::from(VERIFICATION_GAS_LIMIT),
        pre_verification_gas: U256::from(PRE_VERIFICATION_GAS),
        max_fee_per_gas: U256::from(MAX_FEE_PER_GAS),
        max_priority_fee_per_gas: U256::from(MAX_PRIORITY_FEE_PER_GAS),
        paymaster_and_data: Bytes::default(),
        signature: Bytes::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::Token;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("userop-sim").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_point_at_fixed_deployments() {
        let args = parse(&["--chain-id", "5", "--eth-rpc-url", "https://rpc.example"]).unwrap();

        assert_eq!(args.entry_point, ENTRY_POINT_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(args.factory, SIMPLE_ACCOUNT_FACTORY.parse::<Address>().unwrap());
        assert_eq!(args.beneficiary, BENEFICIARY_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(args.timeout_secs, 60);
        assert!(!args.skip_funding);
    }

    #[test]
    fn rejects_non_decimal_chain_id() {
        assert!(parse(&["--chain-id", "sepolia", "--eth-rpc-url", "https://rpc.example"]).is_err());
    }

    #[test]
    fn rejects_empty_rpc_url() {
        let args = parse(&["--chain-id", "5", "--eth-rpc-url", ""]).unwrap();
        assert!(matches!(args.rpc_url(), Err(UserOpError::Config(_))));
    }

    #[test]
    fn rejects_unparseable_rpc_url() {
        let args = parse(&["--chain-id", "5", "--eth-rpc-url", "not a url"]).unwrap();
        assert!(matches!(args.rpc_url(), Err(UserOpError::Config(_))));
    }

    #[tokio::test]
    async fn deploy_operation_is_signed_end_to_end() {
        let factory: Address = SIMPLE_ACCOUNT_FACTORY.parse().unwrap();
        let entry_point: Address = ENTRY_POINT_ADDRESS.parse().unwrap();
        let chain_id = 11155111;

        let (provider, mock) = Provider::mocked();
        let counterfactual = Address::repeat_byte(0x55);
        mock.push::<Bytes, _>(Bytes::from(ethers::abi::encode(&[Token::Address(counterfactual)])))
            .unwrap();

        let owner = KeyPair::generate();
        let sender = resolve_sender(Arc::new(provider), factory, owner.address())
            .await
            .unwrap();
        assert_eq!(sender, counterfactual);

        let init_code = build_init_code(factory, owner.address());
        assert_eq!(init_code, build_init_code(factory, owner.address()));

        let unsigned = build_user_operation(sender, init_code);
        assert!(!unsigned.is_signed());

        let signed = sign_user_operation(&owner, unsigned, entry_point, chain_id).unwrap();
        assert_eq!(signed.signature.len(), 65);
        assert_eq!(signed.nonce, U256::zero());
        assert_eq!(
            recover_signer(&signed, entry_point, chain_id).unwrap(),
            owner.address()
        );
    }
}
