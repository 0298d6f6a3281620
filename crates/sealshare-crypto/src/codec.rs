//! Authenticated record codec: encrypt-then-MAC sealing
//!
//! Sealed record format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag][32 bytes: MAC]
//! MAC = BLAKE3-keyed(mac_key, nonce || ciphertext || poly1305 tag)
//! ```
//!
//! `open` recomputes the MAC and rejects the record before any decryption is
//! attempted.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use sealshare_core::{SealshareError, SealshareResult};

use crate::keys::RecordKeys;
use crate::{MAC_SIZE, NONCE_SIZE, TAG_SIZE};

/// Encrypt `plaintext` under `keys.enc` and append a MAC under `keys.mac`.
pub fn seal(keys: &RecordKeys, plaintext: &[u8]) -> SealshareResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(keys.enc.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| SealshareError::Crypto(format!("record encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len() + MAC_SIZE);
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    let tag = blake3::keyed_hash(keys.mac.as_bytes(), &result);
    result.extend_from_slice(tag.as_bytes());
    Ok(result)
}

/// Verify the trailing MAC, then decrypt.
///
/// Returns `Integrity` without touching the ciphertext if the MAC does not
/// match (tampering, truncation, or the wrong keys).
pub fn open(keys: &RecordKeys, sealed: &[u8]) -> SealshareResult<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE + MAC_SIZE {
        return Err(SealshareError::Integrity(format!(
            "sealed record too short: {} bytes (minimum {})",
            sealed.len(),
            NONCE_SIZE + TAG_SIZE + MAC_SIZE
        )));
    }

    let (body, tag) = sealed.split_at(sealed.len() - MAC_SIZE);
    let mut tag_bytes = [0u8; MAC_SIZE];
    tag_bytes.copy_from_slice(tag);

    // blake3::Hash equality is constant-time
    if blake3::keyed_hash(keys.mac.as_bytes(), body) != blake3::Hash::from(tag_bytes) {
        return Err(SealshareError::Integrity(
            "record MAC mismatch: tampered data or wrong key".into(),
        ));
    }

    let (nonce_bytes, ciphertext) = body.split_at(NONCE_SIZE);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(keys.enc.as_bytes().into());

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| SealshareError::Integrity("record decryption failed: wrong encryption key".into()))
}
