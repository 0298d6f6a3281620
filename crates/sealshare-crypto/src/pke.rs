//! X25519 sealed boxes for invitations
//!
//! Sealed box format:
//! ```text
//! [32 bytes: ephemeral X25519 public key][24 bytes: nonce][ciphertext + 16-byte tag]
//! key = HKDF-SHA256(ikm = DH(ephemeral, recipient), info = label || ephemeral_pk || recipient_pk)
//! AAD = ephemeral_pk || recipient_pk
//! ```

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use sealshare_core::{SealshareError, SealshareResult};

use crate::keys::hkdf_derive;
use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

const X25519_KEY_SIZE: usize = 32;

/// A published X25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionPublicKey(
    #[serde(with = "crate::encoding::b64_array")] [u8; X25519_KEY_SIZE],
);

impl EncryptionPublicKey {
    pub fn from_bytes(bytes: [u8; X25519_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> SealshareResult<Self> {
        let bytes: [u8; X25519_KEY_SIZE] = bytes.try_into().map_err(|_| {
            SealshareError::Protocol(format!(
                "encryption public key must be {X25519_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.0
    }
}

/// The private half, kept only inside the sealed user record.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionSecretKey(#[serde(with = "crate::encoding::b64_array")] [u8; X25519_KEY_SIZE]);

impl EncryptionSecretKey {
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng).to_bytes())
    }

    pub fn public_key(&self) -> EncryptionPublicKey {
        let secret = StaticSecret::from(self.0);
        EncryptionPublicKey(*PublicKey::from(&secret).as_bytes())
    }

    /// Open a sealed box addressed to this key.
    pub fn open(&self, sealed: &[u8]) -> SealshareResult<Vec<u8>> {
        if sealed.len() < X25519_KEY_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(SealshareError::Integrity(format!(
                "sealed box too short: {} bytes",
                sealed.len()
            )));
        }
        let (eph_bytes, rest) = sealed.split_at(X25519_KEY_SIZE);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

        let mut eph = [0u8; X25519_KEY_SIZE];
        eph.copy_from_slice(eph_bytes);
        let eph_public = PublicKey::from(eph);

        let secret = StaticSecret::from(self.0);
        let shared = secret.diffie_hellman(&eph_public);
        if !shared.was_contributory() {
            return Err(SealshareError::Integrity(
                "sealed box uses a low-order ephemeral key".into(),
            ));
        }

        let recipient = self.public_key();
        let key = box_key(shared.as_bytes(), &eph, recipient.as_bytes())?;
        let aad = box_aad(&eph, recipient.as_bytes());

        XChaCha20Poly1305::new((&*key).into())
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| SealshareError::Integrity("sealed box decryption failed".into()))
    }
}

impl std::fmt::Debug for EncryptionSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncryptionSecretKey")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Encrypt `plaintext` so that only the holder of `recipient`'s secret can read it.
pub fn seal_to(recipient: &EncryptionPublicKey, plaintext: &[u8]) -> SealshareResult<Vec<u8>> {
    let eph_secret = EphemeralSecret::random_from_rng(OsRng);
    let eph_public = PublicKey::from(&eph_secret);
    let shared = eph_secret.diffie_hellman(&PublicKey::from(recipient.0));
    if !shared.was_contributory() {
        return Err(SealshareError::Crypto(
            "recipient public key is low-order".into(),
        ));
    }

    let key = box_key(shared.as_bytes(), eph_public.as_bytes(), &recipient.0)?;
    let aad = box_aad(eph_public.as_bytes(), &recipient.0);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let ciphertext = XChaCha20Poly1305::new((&*key).into())
        .encrypt(
            XNonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|e| SealshareError::Crypto(format!("sealed box encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(X25519_KEY_SIZE + NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(eph_public.as_bytes());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

fn box_key(
    shared: &[u8; 32],
    eph: &[u8; X25519_KEY_SIZE],
    recipient: &[u8; X25519_KEY_SIZE],
) -> SealshareResult<Zeroizing<[u8; KEY_SIZE]>> {
    let mut info = b"sealshare-sealed-box".to_vec();
    info.extend_from_slice(eph);
    info.extend_from_slice(recipient);
    hkdf_derive(shared, &info).map(Zeroizing::new)
}

fn box_aad(eph: &[u8; X25519_KEY_SIZE], recipient: &[u8; X25519_KEY_SIZE]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(2 * X25519_KEY_SIZE);
    aad.extend_from_slice(eph);
    aad.extend_from_slice(recipient);
    aad
}
