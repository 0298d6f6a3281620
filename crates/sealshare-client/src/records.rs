//! Persisted record layouts and the seal/open plumbing around them
//!
//! Every record is JSON-encoded, then sealed with `sealshare_crypto::seal`
//! under the keys of the namespace it belongs to.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use sealshare_core::{RecordId, SealshareError, SealshareResult};
use sealshare_crypto::encoding::b64;
use sealshare_crypto::{open, seal, EncryptionSecretKey, RecordKeys, SigningSecretKey};
use sealshare_storage::Datastore;

/// The sealed blob at `user_record_id(username)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UserRecord {
    pub username: String,
    pub encryption_key: EncryptionSecretKey,
    pub signing_key: SigningSecretKey,
    /// Protects every `FileEntry` this user owns or has accepted
    pub file_keys: RecordKeys,
    /// Protects this user's `SharingTree`s
    pub share_tree_keys: RecordKeys,
}

/// Direct pointer to a file: its root keys and head chunk.
///
/// Stored in the owner's entry, and (sealed under separate keys) at every
/// indirection record handed to recipients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FilePointer {
    pub root: RecordKeys,
    pub head: RecordId,
}

/// What a recipient holds: where the indirection record lives and the keys
/// that open it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ShareLink {
    pub id: RecordId,
    pub keys: RecordKeys,
}

/// The record at `file_entry_id(username, filename)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum FileEntry {
    Owned(FilePointer),
    Shared(ShareLink),
}

/// Head-only metadata: the tail's id and its index (chain length − 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChainHead {
    pub tail: RecordId,
    pub last_index: u64,
}

/// One link of a file's chunk chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Chunk {
    #[serde(with = "b64")]
    pub data: Vec<u8>,
    pub next: Option<RecordId>,
    /// Present on chunk 0 only
    pub head: Option<ChainHead>,
}

/// Owner-side record of who was handed which indirection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SharingTree {
    pub recipients: BTreeMap<String, RecordId>,
    pub links: BTreeMap<RecordId, RecordKeys>,
}

impl SharingTree {
    pub fn link_for(&self, recipient: &str) -> Option<ShareLink> {
        let id = *self.recipients.get(recipient)?;
        let keys = self.links.get(&id)?.clone();
        Some(ShareLink { id, keys })
    }

    pub fn insert(&mut self, recipient: &str, link: &ShareLink) {
        self.recipients.insert(recipient.to_string(), link.id);
        self.links.insert(link.id, link.keys.clone());
    }

    /// Remove a recipient and its indirection. Returns the indirection id.
    pub fn remove(&mut self, recipient: &str) -> Option<RecordId> {
        let id = self.recipients.remove(recipient)?;
        self.links.remove(&id);
        Some(id)
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> SealshareResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8], what: &str) -> SealshareResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| SealshareError::Protocol(format!("malformed {what}: {e}")))
}

/// Encode, seal, and store `value` at `id`.
pub(crate) fn put_sealed<T: Serialize>(
    store: &dyn Datastore,
    id: RecordId,
    keys: &RecordKeys,
    value: &T,
) -> SealshareResult<()> {
    store.put(id, seal(keys, &encode(value)?)?)
}

/// Fetch, verify, and decode the record at `id`. `Ok(None)` if absent.
pub(crate) fn get_sealed<T: DeserializeOwned>(
    store: &dyn Datastore,
    id: RecordId,
    keys: &RecordKeys,
    what: &str,
) -> SealshareResult<Option<T>> {
    match store.get(id)? {
        None => Ok(None),
        Some(blob) => {
            let plaintext = open(keys, &blob)?;
            decode(&plaintext, what).map(Some)
        }
    }
}
