//! sealshare-crypto: primitives behind the encrypted sharing protocol
//!
//! Every record the client writes is sealed with encrypt-then-MAC:
//! ```text
//! [24 bytes: random nonce][ciphertext + 16-byte Poly1305 tag][32 bytes: BLAKE3 keyed MAC]
//! MAC = BLAKE3-keyed(mac_key, nonce || ciphertext)
//! ```
//!
//! Key hierarchy:
//! ```text
//! Credential keys (Argon2id over H(username) || H(password), HKDF split into enc/mac)
//!   └── User record
//!         ├── file-entry namespace keys (random)   -> FileEntry records
//!         ├── share-tree namespace keys (random)   -> SharingTree records
//!         ├── X25519 secret (invitations in)
//!         └── Ed25519 secret (invitations out)
//! File root keys (random per file)
//!   └── Chunk keys: HKDF(root, "sealshare-chunk-{enc,mac}/<index>")
//! ```

pub mod codec;
pub mod encoding;
pub mod ids;
pub mod kdf;
pub mod keys;
pub mod pke;
pub mod sign;

pub use codec::{open, seal};
pub use kdf::{derive_credential_keys, KdfParams};
pub use keys::{chunk_keys, RecordKeys, SymmetricKey};
pub use pke::{EncryptionPublicKey, EncryptionSecretKey};
pub use sign::{SigningSecretKey, VerifyingPublicKey};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the BLAKE3 keyed MAC appended to every sealed record
pub const MAC_SIZE: usize = 32;

/// Size of an Ed25519 signature
pub const SIGNATURE_SIZE: usize = 64;
