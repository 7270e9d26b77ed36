// src/signer.rs
use ethers::prelude::k256::ecdsa::SigningKey;
use ethers::types::{Address, Bytes, Signature};
use ethers::utils::hash_message;

use crate::error::UserOpError;
use crate::types::{UserOperation, UserOperationHash, SIGNATURE_LEN};
use crate::wallet::KeyPair;

/// Offset added to the raw recovery id so `v` lands in {27, 28}.
const RECOVERY_ID_OFFSET: u8 = 27;

/// Signs `user_op` for `entry_point` on `chain_id` and returns the signed copy.
///
/// The operation is only handed back once the 65-byte signature is in place;
/// on failure the caller keeps nothing.
pub fn sign_user_operation(
    owner: &KeyPair,
    user_op: UserOperation,
    entry_point: Address,
    chain_id: u64,
) -> Result<UserOperation, UserOpError> {
    let user_op_hash = user_op.hash(&entry_point, chain_id);
    let signature = sign_hash(owner.signing_key(), &user_op_hash)?;

    Ok(UserOperation {
        signature,
        ..user_op
    })
}

/// Personal-sign over the operation hash: `keccak("\x19Ethereum Signed
/// Message:\n32" ‖ hash)` signed with recoverable ECDSA, encoded `r ‖ s ‖ v`.
pub fn sign_hash(key: &SigningKey, user_op_hash: &UserOperationHash) -> Result<Bytes, UserOpError> {
    let digest = hash_message(user_op_hash.as_bytes());

    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| UserOpError::Crypto(e.to_string()))?;

    let mut encoded = Vec::with_capacity(SIGNATURE_LEN);
    encoded.extend_from_slice(&signature.to_bytes());
    encoded.push(recovery_id.to_byte() + RECOVERY_ID_OFFSET);

    Ok(Bytes::from(encoded))
}

/// Recovers the owner address that signed `user_op`.
pub fn recover_signer(
    user_op: &UserOperation,
    entry_point: Address,
    chain_id: u64,
) -> Result<Address, UserOpError> {
    if !user_op.is_signed() {
        return Err(UserOpError::Crypto(format!(
            "expected a {SIGNATURE_LEN}-byte signature, got {} bytes",
            user_op.signature.len()
        )));
    }

    let signature = Signature::try_from(user_op.signature.as_ref())
        .map_err(|e| UserOpError::Crypto(e.to_string()))?;
    let user_op_hash = user_op.hash(&entry_point, chain_id);

    signature
        .recover(user_op_hash.as_bytes())
        .map_err(|e| UserOpError::Crypto(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::prelude::k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::U256;

    const CHAIN_ID: u64 = 5;

    fn entry_point() -> Address {
        "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse().unwrap()
    }

    fn unsigned_op() -> UserOperation {
        UserOperation {
            sender: Address::repeat_byte(0x22),
            nonce: U256::zero(),
            init_code: Bytes::from(vec![0x61; 88]),
            call_gas_limit: 200_000.into(),
            verification_gas_limit: 500_000.into(),
            pre_verification_gas: 500_000.into(),
            max_fee_per_gas: 200_000.into(),
            max_priority_fee_per_gas: 200_000.into(),
            ..Default::default()
        }
    }

    #[test]
    fn signature_is_65_bytes_with_normalized_v() {
        for _ in 0..16 {
            let owner = KeyPair::generate();
            let signed = sign_user_operation(&owner, unsigned_op(), entry_point(), CHAIN_ID).unwrap();

            assert!(signed.is_signed());
            assert_eq!(signed.signature.len(), SIGNATURE_LEN);
            let v = signed.signature[64];
            assert!(v == 27 || v == 28, "unexpected v {v}");
        }
    }

    #[test]
    fn signing_leaves_other_fields_untouched() {
        let owner = KeyPair::generate();
        let unsigned = unsigned_op();
        let signed = sign_user_operation(&owner, unsigned.clone(), entry_point(), CHAIN_ID).unwrap();

        assert_eq!(
            UserOperation {
                signature: Bytes::default(),
                ..signed
            },
            unsigned
        );
    }

    #[test]
    fn recovers_owner_address() {
        let owner = KeyPair::generate();
        let signed = sign_user_operation(&owner, unsigned_op(), entry_point(), CHAIN_ID).unwrap();

        assert_eq!(
            recover_signer(&signed, entry_point(), CHAIN_ID).unwrap(),
            owner.address()
        );
    }

    #[test]
    fn recovers_owner_public_key() {
        let owner = KeyPair::generate();
        let signed = sign_user_operation(&owner, unsigned_op(), entry_point(), CHAIN_ID).unwrap();

        let user_op_hash = signed.hash(&entry_point(), CHAIN_ID);
        let digest = hash_message(user_op_hash.as_bytes());
        let signature = EcdsaSignature::from_slice(&signed.signature[..64]).unwrap();
        let recovery_id = RecoveryId::from_byte(signed.signature[64] - RECOVERY_ID_OFFSET).unwrap();

        let recovered =
            VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id).unwrap();
        assert_eq!(&recovered, owner.signing_key().verifying_key());
    }

    #[test]
    fn signature_does_not_verify_for_another_chain_or_entry_point() {
        let owner = KeyPair::generate();
        let signed = sign_user_operation(&owner, unsigned_op(), entry_point(), CHAIN_ID).unwrap();

        assert_ne!(
            recover_signer(&signed, entry_point(), CHAIN_ID + 1).unwrap(),
            owner.address()
        );
        assert_ne!(
            recover_signer(&signed, Address::repeat_byte(0x01), CHAIN_ID).unwrap(),
            owner.address()
        );
    }

    #[test]
    fn recover_rejects_unsigned_operation() {
        assert!(matches!(
            recover_signer(&unsigned_op(), entry_point(), CHAIN_ID),
            Err(UserOpError::Crypto(_))
        ));
    }

    #[tokio::test]
    async fn matches_ethers_personal_sign() {
        let owner = KeyPair::generate();
        let user_op_hash = unsigned_op().hash(&entry_point(), CHAIN_ID);
        let ours = sign_hash(owner.signing_key(), &user_op_hash).unwrap();

        let wallet = LocalWallet::from(owner.signing_key().clone());
        let theirs = wallet.sign_message(user_op_hash.as_bytes()).await.unwrap();

        assert_eq!(ours.to_vec(), theirs.to_vec());
    }
}
