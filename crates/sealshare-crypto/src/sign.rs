//! Ed25519 signing keys for invitation authenticity

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use sealshare_core::{SealshareError, SealshareResult};

use crate::SIGNATURE_SIZE;

const ED25519_KEY_SIZE: usize = 32;

/// A published Ed25519 verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingPublicKey(
    #[serde(with = "crate::encoding::b64_array")] [u8; ED25519_KEY_SIZE],
);

impl VerifyingPublicKey {
    pub fn from_slice(bytes: &[u8]) -> SealshareResult<Self> {
        let bytes: [u8; ED25519_KEY_SIZE] = bytes.try_into().map_err(|_| {
            SealshareError::Protocol(format!(
                "verification key must be {ED25519_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ED25519_KEY_SIZE] {
        &self.0
    }

    /// Strict Ed25519 verification. Any failure is an integrity error.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> SealshareResult<()> {
        let key = VerifyingKey::from_bytes(&self.0)
            .map_err(|_| SealshareError::Integrity("malformed verification key".into()))?;
        let signature: [u8; SIGNATURE_SIZE] = signature
            .try_into()
            .map_err(|_| SealshareError::Integrity("malformed signature".into()))?;
        key.verify_strict(message, &Signature::from_bytes(&signature))
            .map_err(|_| SealshareError::Integrity("signature verification failed".into()))
    }
}

/// The private half, kept only inside the sealed user record.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecretKey(#[serde(with = "crate::encoding::b64_array")] [u8; ED25519_KEY_SIZE]);

impl SigningSecretKey {
    pub fn generate() -> Self {
        Self(SigningKey::generate(&mut OsRng).to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingPublicKey {
        VerifyingPublicKey(SigningKey::from_bytes(&self.0).verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        SigningKey::from_bytes(&self.0).sign(message).to_bytes()
    }
}

impl std::fmt::Debug for SigningSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SigningSecretKey").field(&"[REDACTED]").finish()
    }
}
