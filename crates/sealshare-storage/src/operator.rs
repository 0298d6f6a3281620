//! OpenDAL-backed datastore and keystore
//!
//! The client API is synchronous, so each backend owns a small current-thread
//! tokio runtime and blocks on every OpenDAL call. Do not call these from
//! inside another async runtime.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use opendal::Operator;

use sealshare_core::config::{StorageBackend, StorageConfig};
use sealshare_core::{RecordId, SealshareError, SealshareResult};

use crate::backend::{Datastore, Keystore};

/// S3 access credentials, supplied by the embedding application
#[derive(Debug, Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Build an OpenDAL Operator for the configured backend.
///
/// For S3: if `enforce_tls` is true and the endpoint uses HTTP, this returns an
/// error. Otherwise, a warning is logged for non-HTTPS endpoints.
pub fn build_operator(storage: &StorageConfig, creds: Option<&S3Credentials>) -> Result<Operator> {
    match storage.backend {
        StorageBackend::Memory => Ok(Operator::new(opendal::services::Memory::default())
            .context("creating OpenDAL memory operator")?
            .finish()),
        StorageBackend::S3 => {
            let creds = creds.context("S3 backend requires credentials")?;
            if storage.endpoint.starts_with("http://") {
                if storage.enforce_tls {
                    anyhow::bail!(
                        "S3 endpoint uses plaintext HTTP ({}), but enforce_tls is enabled",
                        storage.endpoint
                    );
                }
                tracing::warn!(
                    endpoint = %storage.endpoint,
                    "S3 endpoint uses plaintext HTTP; credentials are transmitted unencrypted"
                );
            }

            let builder = opendal::services::S3::default()
                .endpoint(&storage.endpoint)
                .region(&storage.region)
                .bucket(&storage.bucket)
                .access_key_id(&creds.access_key_id)
                .secret_access_key(&creds.secret_access_key);

            let op = Operator::new(builder)
                .context("creating OpenDAL S3 operator")?
                .layer(opendal::layers::LoggingLayer::default())
                .layer(
                    opendal::layers::RetryLayer::new()
                        .with_max_times(5)
                        .with_jitter(),
                )
                .finish();
            Ok(op)
        }
    }
}

/// Datastore + keystore over one OpenDAL operator.
///
/// Records live at `{prefix}/records/{uuid}`, public keys at
/// `{prefix}/keys/{base64url(name)}`.
pub struct OpendalBackend {
    op: Operator,
    prefix: String,
    runtime: tokio::runtime::Runtime,
}

impl OpendalBackend {
    pub fn new(op: Operator, prefix: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building tokio runtime for OpenDAL backend")?;
        Ok(Self {
            op,
            prefix: prefix.trim_end_matches('/').to_string(),
            runtime,
        })
    }

    /// Build from config. Credentials are only consulted for S3.
    pub fn from_config(storage: &StorageConfig, creds: Option<&S3Credentials>) -> Result<Self> {
        Self::new(build_operator(storage, creds)?, &storage.prefix)
    }

    fn record_path(&self, id: RecordId) -> String {
        format!("{}/records/{}", self.prefix, id)
    }

    fn key_path(&self, name: &str) -> String {
        format!("{}/keys/{}", self.prefix, URL_SAFE_NO_PAD.encode(name))
    }

    fn read_optional(&self, path: &str) -> SealshareResult<Option<Vec<u8>>> {
        match self.runtime.block_on(self.op.read(path)) {
            Ok(buf) => Ok(Some(buf.to_vec())),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SealshareError::Storage(format!("reading {path}: {e}"))),
        }
    }

    fn write(&self, path: &str, data: Vec<u8>) -> SealshareResult<()> {
        self.runtime
            .block_on(self.op.write(path, data))
            .map(|_| ())
            .map_err(|e| SealshareError::Storage(format!("writing {path}: {e}")))
    }
}

impl Datastore for OpendalBackend {
    fn put(&self, id: RecordId, data: Vec<u8>) -> SealshareResult<()> {
        self.write(&self.record_path(id), data)
    }

    fn get(&self, id: RecordId) -> SealshareResult<Option<Vec<u8>>> {
        self.read_optional(&self.record_path(id))
    }

    fn delete(&self, id: RecordId) -> SealshareResult<()> {
        let path = self.record_path(id);
        self.runtime
            .block_on(self.op.delete(&path))
            .map_err(|e| SealshareError::Storage(format!("deleting {path}: {e}")))
    }
}

impl Keystore for OpendalBackend {
    fn publish(&self, name: &str, key: Vec<u8>) -> SealshareResult<()> {
        // Check-then-write is not atomic on object stores; concurrent
        // publishers of the same name race, last writer wins.
        let path = self.key_path(name);
        if self.read_optional(&path)?.is_some() {
            return Err(SealshareError::Conflict(format!(
                "public key already published: {name}"
            )));
        }
        self.write(&path, key)
    }

    fn lookup(&self, name: &str) -> SealshareResult<Option<Vec<u8>>> {
        self.read_optional(&self.key_path(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_backend() -> OpendalBackend {
        OpendalBackend::from_config(&StorageConfig::default(), None).unwrap()
    }

    #[test]
    fn test_datastore_roundtrip() {
        let backend = memory_backend();
        let id = RecordId::random();

        assert_eq!(backend.get(id).unwrap(), None);
        backend.put(id, b"sealed".to_vec()).unwrap();
        assert_eq!(backend.get(id).unwrap(), Some(b"sealed".to_vec()));
        backend.delete(id).unwrap();
        assert_eq!(backend.get(id).unwrap(), None);
    }

    #[test]
    fn test_keystore_append_only() {
        let backend = memory_backend();
        backend.publish("a/b weird name", vec![1, 2, 3]).unwrap();
        assert!(matches!(
            backend.publish("a/b weird name", vec![4]),
            Err(SealshareError::Conflict(_))
        ));
        assert_eq!(backend.lookup("a/b weird name").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(backend.lookup("missing").unwrap(), None);
    }

    #[test]
    fn test_s3_requires_credentials() {
        let storage = StorageConfig {
            backend: StorageBackend::S3,
            ..Default::default()
        };
        assert!(build_operator(&storage, None).is_err());
    }

    #[test]
    fn test_s3_http_enforce_tls() {
        let storage = StorageConfig {
            backend: StorageBackend::S3,
            endpoint: "http://insecure:8333".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let creds = S3Credentials {
            access_key_id: "key".into(),
            secret_access_key: "secret".into(),
        };
        let result = build_operator(&storage, Some(&creds));
        assert!(result.is_err(), "HTTP + enforce_tls must fail");
        assert!(result.unwrap_err().to_string().contains("enforce_tls"));
    }

    #[test]
    fn test_s3_https_builds() {
        let storage = StorageConfig {
            backend: StorageBackend::S3,
            endpoint: "https://s3.example.com:8333".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let creds = S3Credentials {
            access_key_id: "key".into(),
            secret_access_key: "secret".into(),
        };
        assert!(build_operator(&storage, Some(&creds)).is_ok());
    }
}
