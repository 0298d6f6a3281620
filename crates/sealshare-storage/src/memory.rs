//! In-memory backends with explicit reset between test cases

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sealshare_core::{RecordId, SealshareError, SealshareResult};

use crate::backend::{Datastore, Keystore};

fn read_lock<T>(lock: &RwLock<T>) -> SealshareResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| SealshareError::Storage("in-memory store lock poisoned".into()))
}

fn write_lock<T>(lock: &RwLock<T>) -> SealshareResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| SealshareError::Storage("in-memory store lock poisoned".into()))
}

#[derive(Debug, Default)]
pub struct MemoryDatastore {
    records: RwLock<HashMap<RecordId, Vec<u8>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record.
    pub fn reset(&self) -> SealshareResult<()> {
        write_lock(&self.records)?.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        read_lock(&self.records).map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the full store, for inspecting what an adversary would see.
    pub fn snapshot(&self) -> SealshareResult<HashMap<RecordId, Vec<u8>>> {
        Ok(read_lock(&self.records)?.clone())
    }
}

impl Datastore for MemoryDatastore {
    fn put(&self, id: RecordId, data: Vec<u8>) -> SealshareResult<()> {
        write_lock(&self.records)?.insert(id, data);
        Ok(())
    }

    fn get(&self, id: RecordId) -> SealshareResult<Option<Vec<u8>>> {
        Ok(read_lock(&self.records)?.get(&id).cloned())
    }

    fn delete(&self, id: RecordId) -> SealshareResult<()> {
        write_lock(&self.records)?.remove(&id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeystore {
    keys: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKeystore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) -> SealshareResult<()> {
        write_lock(&self.keys)?.clear();
        Ok(())
    }
}

impl Keystore for MemoryKeystore {
    fn publish(&self, name: &str, key: Vec<u8>) -> SealshareResult<()> {
        let mut keys = write_lock(&self.keys)?;
        if keys.contains_key(name) {
            return Err(SealshareError::Conflict(format!(
                "public key already published: {name}"
            )));
        }
        keys.insert(name.to_string(), key);
        Ok(())
    }

    fn lookup(&self, name: &str) -> SealshareResult<Option<Vec<u8>>> {
        Ok(read_lock(&self.keys)?.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryDatastore::new();
        let id = RecordId::random();

        assert_eq!(store.get(id).unwrap(), None);
        store.put(id, b"one".to_vec()).unwrap();
        assert_eq!(store.get(id).unwrap(), Some(b"one".to_vec()));

        store.put(id, b"two".to_vec()).unwrap();
        assert_eq!(store.get(id).unwrap(), Some(b"two".to_vec()), "last writer wins");

        store.delete(id).unwrap();
        assert_eq!(store.get(id).unwrap(), None);
        store.delete(id).unwrap();
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = MemoryDatastore::new();
        store.put(RecordId::random(), vec![1]).unwrap();
        store.put(RecordId::random(), vec![2]).unwrap();
        assert_eq!(store.len(), 2);

        store.reset().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_keystore_append_only() {
        let keys = MemoryKeystore::new();
        keys.publish("alice/encryption", vec![1; 32]).unwrap();

        let again = keys.publish("alice/encryption", vec![2; 32]);
        assert!(matches!(again, Err(SealshareError::Conflict(_))));
        assert_eq!(keys.lookup("alice/encryption").unwrap(), Some(vec![1; 32]));
        assert_eq!(keys.lookup("bob/encryption").unwrap(), None);
    }

    #[test]
    fn test_keystore_reset() {
        let keys = MemoryKeystore::new();
        keys.publish("alice/encryption", vec![1]).unwrap();
        keys.reset().unwrap();
        keys.publish("alice/encryption", vec![2]).unwrap();
        assert_eq!(keys.lookup("alice/encryption").unwrap(), Some(vec![2]));
    }
}
