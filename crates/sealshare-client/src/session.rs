//! A logged-in user's session
//!
//! Sessions hold the user's secrets and nothing else: every operation reads
//! current state from the backends, so two sessions for the same user never
//! share in-memory state.

use std::sync::Arc;

use sealshare_core::{RecordId, SealshareError, SealshareResult};
use sealshare_crypto::ids::{file_entry_id, share_tree_id};
use sealshare_crypto::{EncryptionPublicKey, VerifyingPublicKey};
use sealshare_storage::{Datastore, Keystore};

use crate::records::{get_sealed, put_sealed, FileEntry, FilePointer, SharingTree, UserRecord};

/// Keystore name of a user's published X25519 key.
pub(crate) fn encryption_key_name(username: &str) -> String {
    format!("{username}/encryption")
}

/// Keystore name of a user's published Ed25519 key.
pub(crate) fn verification_key_name(username: &str) -> String {
    format!("{username}/verification")
}

pub struct User {
    pub(crate) record: UserRecord,
    pub(crate) datastore: Arc<dyn Datastore>,
    pub(crate) keystore: Arc<dyn Keystore>,
    pub(crate) block_size: usize,
}

impl User {
    pub(crate) fn new(
        record: UserRecord,
        datastore: Arc<dyn Datastore>,
        keystore: Arc<dyn Keystore>,
        block_size: usize,
    ) -> Self {
        Self {
            record,
            datastore,
            keystore,
            block_size,
        }
    }

    pub fn username(&self) -> &str {
        &self.record.username
    }

    pub(crate) fn store(&self) -> &dyn Datastore {
        self.datastore.as_ref()
    }

    pub(crate) fn entry_id(&self, filename: &str) -> RecordId {
        file_entry_id(self.username(), filename)
    }

    pub(crate) fn load_entry(&self, filename: &str) -> SealshareResult<Option<FileEntry>> {
        get_sealed(
            self.store(),
            self.entry_id(filename),
            &self.record.file_keys,
            "file entry",
        )
    }

    pub(crate) fn save_entry(&self, filename: &str, entry: &FileEntry) -> SealshareResult<()> {
        put_sealed(
            self.store(),
            self.entry_id(filename),
            &self.record.file_keys,
            entry,
        )
    }

    pub(crate) fn load_sharing_tree(&self, filename: &str) -> SealshareResult<Option<SharingTree>> {
        get_sealed(
            self.store(),
            share_tree_id(self.username(), filename),
            &self.record.share_tree_keys,
            "sharing tree",
        )
    }

    pub(crate) fn save_sharing_tree(
        &self,
        filename: &str,
        tree: &SharingTree,
    ) -> SealshareResult<()> {
        put_sealed(
            self.store(),
            share_tree_id(self.username(), filename),
            &self.record.share_tree_keys,
            tree,
        )
    }

    /// Follow an entry to the file it names.
    ///
    /// Owners resolve directly. Recipients take one hop through their
    /// indirection record; if that record is gone their access was revoked
    /// and this fails with `Permission`.
    pub(crate) fn resolve_entry(&self, entry: &FileEntry) -> SealshareResult<FilePointer> {
        match entry {
            FileEntry::Owned(pointer) => Ok(pointer.clone()),
            FileEntry::Shared(link) => {
                get_sealed(self.store(), link.id, &link.keys, "indirection record")?.ok_or_else(
                    || SealshareError::Permission("access to this file has been revoked".into()),
                )
            }
        }
    }

    /// Resolve `filename` to its file pointer, failing with `NotFound` when
    /// this user has no such file.
    pub(crate) fn resolve(&self, filename: &str) -> SealshareResult<FilePointer> {
        let entry = self
            .load_entry(filename)?
            .ok_or_else(|| SealshareError::NotFound(format!("no such file: {filename}")))?;
        self.resolve_entry(&entry)
    }

    pub(crate) fn lookup_encryption_key(&self, username: &str) -> SealshareResult<EncryptionPublicKey> {
        let bytes = self
            .keystore
            .lookup(&encryption_key_name(username))?
            .ok_or_else(|| SealshareError::NotFound(format!("unknown user: {username}")))?;
        EncryptionPublicKey::from_slice(&bytes)
    }

    pub(crate) fn lookup_verification_key(&self, username: &str) -> SealshareResult<VerifyingPublicKey> {
        let bytes = self
            .keystore
            .lookup(&verification_key_name(username))?
            .ok_or_else(|| SealshareError::NotFound(format!("unknown user: {username}")))?;
        VerifyingPublicKey::from_slice(&bytes)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("username", &self.record.username)
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}
