//! Datastore health check

use sealshare_core::{RecordId, SealshareError, SealshareResult};

use crate::backend::Datastore;

/// Verify the datastore accepts a write, returns it, and forgets it on delete.
pub fn check_health(store: &dyn Datastore) -> SealshareResult<()> {
    let probe = RecordId::random();
    let payload = b"sealshare-health-probe".to_vec();

    store.put(probe, payload.clone())?;
    let read_back = store.get(probe)?;
    store.delete(probe)?;

    if read_back.as_deref() != Some(payload.as_slice()) {
        return Err(SealshareError::Storage(
            "storage health check failed: probe not read back".into(),
        ));
    }
    if store.get(probe)?.is_some() {
        return Err(SealshareError::Storage(
            "storage health check failed: probe survived delete".into(),
        ));
    }
    Ok(())
}

/// Returns true if storage is reachable, false otherwise (non-panicking)
pub fn is_healthy(store: &dyn Datastore) -> bool {
    check_health(store).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDatastore;

    struct BlackHole;

    impl Datastore for BlackHole {
        fn put(&self, _id: RecordId, _data: Vec<u8>) -> SealshareResult<()> {
            Ok(())
        }
        fn get(&self, _id: RecordId) -> SealshareResult<Option<Vec<u8>>> {
            Ok(None)
        }
        fn delete(&self, _id: RecordId) -> SealshareResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_memory_store_healthy() {
        let store = MemoryDatastore::new();
        assert!(is_healthy(&store));
        assert!(store.is_empty(), "probe must be cleaned up");
    }

    #[test]
    fn test_store_that_drops_writes_unhealthy() {
        assert!(matches!(
            check_health(&BlackHole),
            Err(SealshareError::Storage(_))
        ));
    }
}
