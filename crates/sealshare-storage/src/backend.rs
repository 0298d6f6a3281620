use sealshare_core::{RecordId, SealshareResult};

/// Untrusted key-value store. Anyone may read, overwrite, or delete any record.
pub trait Datastore: Send + Sync {
    fn put(&self, id: RecordId, data: Vec<u8>) -> SealshareResult<()>;

    /// `Ok(None)` when nothing is stored at `id` (including after `delete`).
    fn get(&self, id: RecordId) -> SealshareResult<Option<Vec<u8>>>;

    /// Deleting an absent record is not an error.
    fn delete(&self, id: RecordId) -> SealshareResult<()>;
}

/// Append-only public-key directory.
pub trait Keystore: Send + Sync {
    /// Fails with `Conflict` if `name` is already published.
    fn publish(&self, name: &str, key: Vec<u8>) -> SealshareResult<()>;

    fn lookup(&self, name: &str) -> SealshareResult<Option<Vec<u8>>>;
}
