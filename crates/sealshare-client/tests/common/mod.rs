//! Shared fixtures: fresh in-memory backends per test, cheap Argon2
//! parameters, and a 10-byte block size so small inputs span many chunks.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use sealshare_client::{Client, RecordId, SealshareConfig, User};
use sealshare_core::config::KdfConfig;
use sealshare_storage::{MemoryDatastore, MemoryKeystore};

pub const BLOCK: usize = 10;

pub struct Harness {
    pub client: Client,
    pub datastore: Arc<MemoryDatastore>,
    pub keystore: Arc<MemoryKeystore>,
}

impl Harness {
    pub fn new() -> Self {
        let mut config = SealshareConfig::default();
        config.client.block_size = BLOCK;
        config.kdf = KdfConfig {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        };
        let datastore = Arc::new(MemoryDatastore::new());
        let keystore = Arc::new(MemoryKeystore::new());
        let client = Client::new(datastore.clone(), keystore.clone(), &config).unwrap();
        Self {
            client,
            datastore,
            keystore,
        }
    }

    /// Register `name` with the password `"{name}-pw"`.
    pub fn user(&self, name: &str) -> User {
        self.client.register(name, &format!("{name}-pw")).unwrap()
    }

    pub fn login(&self, name: &str) -> User {
        self.client.login(name, &format!("{name}-pw")).unwrap()
    }

    pub fn ids(&self) -> HashSet<RecordId> {
        self.datastore.snapshot().unwrap().into_keys().collect()
    }

    /// Run `f` and return the ids of the records it created.
    pub fn new_ids(&self, f: impl FnOnce()) -> Vec<RecordId> {
        let before = self.ids();
        f();
        self.ids().difference(&before).copied().collect()
    }

    /// Flip one bit of the record at `id`.
    pub fn flip_bit(&self, id: RecordId, byte: usize, bit: u8) {
        use sealshare_storage::Datastore;
        let mut blob = self.datastore.get(id).unwrap().unwrap();
        let byte = byte % blob.len();
        blob[byte] ^= 1 << bit;
        self.datastore.put(id, blob).unwrap();
    }
}

/// Owner stores `filename`, invites `recipient`, recipient accepts under the
/// same name.
pub fn share(owner: &User, recipient: &User, filename: &str) {
    let token = owner
        .create_invitation(filename, recipient.username())
        .unwrap();
    recipient
        .accept_invitation(owner.username(), token, filename)
        .unwrap();
}
