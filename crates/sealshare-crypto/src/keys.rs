//! Symmetric key types, random generation, and HKDF derivation

use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use sealshare_core::{SealshareError, SealshareResult};

use crate::KEY_SIZE;

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey(#[serde(with = "crate::encoding::b64_array")] [u8; KEY_SIZE]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// HKDF-SHA256 expansion of this key under a domain label.
    pub fn derive(&self, info: &[u8]) -> SealshareResult<SymmetricKey> {
        hkdf_derive(&self.0, info).map(Self)
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SymmetricKey").field(&"[REDACTED]").finish()
    }
}

/// An (encryption key, MAC key) pair protecting one record or namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordKeys {
    pub enc: SymmetricKey,
    pub mac: SymmetricKey,
}

impl RecordKeys {
    /// Two independent random keys.
    pub fn generate() -> Self {
        Self {
            enc: SymmetricKey::generate(),
            mac: SymmetricKey::generate(),
        }
    }
}

/// Per-chunk keys for the chunk at `index`, derived from a file's root keys.
///
/// Every position gets its own pair, so rewriting a chunk at one index never
/// reuses the keys of another.
pub fn chunk_keys(root: &RecordKeys, index: u64) -> SealshareResult<RecordKeys> {
    Ok(RecordKeys {
        enc: root
            .enc
            .derive(format!("sealshare-chunk-enc/{index}").as_bytes())?,
        mac: root
            .mac
            .derive(format!("sealshare-chunk-mac/{index}").as_bytes())?,
    })
}

/// HKDF-SHA256 key derivation with a domain-specific info string.
pub(crate) fn hkdf_derive(ikm: &[u8], info: &[u8]) -> SealshareResult<[u8; KEY_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(info, &mut okm)
        .map_err(|e| SealshareError::Crypto(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}
