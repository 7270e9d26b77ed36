// src/wallet.rs
use std::fmt;

use ethers::prelude::{k256::ecdsa::SigningKey, rand::thread_rng};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use tracing::debug;

#[cfg(test)]
use crate::error::UserOpError;

/// Ephemeral owner of the smart wallet.
///
/// The secret scalar lives inside a k256 `SigningKey`, which zeroes itself on
/// drop, so it is wiped on every path out of the scope that owns the pair.
pub struct KeyPair {
    wallet: LocalWallet,
}

impl KeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut thread_rng());
        Self {
            wallet: LocalWallet::from(signing_key),
        }
    }

    #[cfg(test)]
    pub fn from_bytes(secret: &[u8]) -> Result<Self, UserOpError> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|e| UserOpError::Crypto(e.to_string()))?;
        Ok(Self {
            wallet: LocalWallet::from(signing_key),
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn signing_key(&self) -> &SigningKey {
        self.wallet.signer()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        // the SigningKey field wipes itself once this returns
        debug!("Dropping owner key for {:?}", self.address());
    }
}
