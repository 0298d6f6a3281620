//! Deterministic record locations derived from usernames and filenames
//!
//! Each namespace has its own domain label and fields are length-prefixed, so
//! ids from different namespaces (or different field splits) never collide.

use sha2::{Digest, Sha256};

use sealshare_core::RecordId;

/// SHA-256 of `data`.
pub fn hash(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

fn derive_id(domain: &str, fields: &[&str]) -> RecordId {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    for field in fields {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    let digest = hasher.finalize();
    let mut id = [0u8; 16];
    id.copy_from_slice(&digest[..16]);
    RecordId::from_bytes(id)
}

/// Where a user's sealed record lives. Depends on the username only.
pub fn user_record_id(username: &str) -> RecordId {
    derive_id("sealshare/user", &[username])
}

/// Where a user's entry for `filename` lives.
pub fn file_entry_id(username: &str, filename: &str) -> RecordId {
    derive_id("sealshare/file-entry", &[username, filename])
}

/// Where the owner's sharing tree for `filename` lives.
pub fn share_tree_id(username: &str, filename: &str) -> RecordId {
    derive_id("sealshare/share-tree", &[username, filename])
}
