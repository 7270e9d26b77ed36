// src/contracts.rs
//! Bindings for the two contracts the run talks to: the SimpleAccount factory
//! (counterfactual address + deployment call) and the v0.6 EntryPoint.
use ethers::contract::abigen;

abigen!(
    SimpleAccountFactory,
    r#"[
        function createAccount(address owner, uint256 salt) external returns (address ret)
        function getAddress(address owner, uint256 salt) external view returns (address)
    ]"#
);

abigen!(
    EntryPoint,
    r#"[
        struct UserOperation {address sender;uint256 nonce;bytes initCode;bytes callData;uint256 callGasLimit;uint256 verificationGasLimit;uint256 preVerificationGas;uint256 maxFeePerGas;uint256 maxPriorityFeePerGas;bytes paymasterAndData;bytes signature;}
        function handleOps(UserOperation[] calldata ops, address payable beneficiary) external
    ]"#
);
