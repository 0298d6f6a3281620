use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SealshareError, SealshareResult};

/// Top-level client configuration (loaded from sealshare.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SealshareConfig {
    pub client: ClientConfig,
    pub kdf: KdfConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl SealshareConfig {
    /// Read and parse a TOML config file, then validate it.
    pub fn load(path: &Path) -> SealshareResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> SealshareResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| SealshareError::Config(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SealshareResult<()> {
        if self.client.block_size == 0 {
            return Err(SealshareError::Config(
                "client.block_size must be greater than zero".into(),
            ));
        }
        if self.kdf.mem_cost_kib == 0 || self.kdf.time_cost == 0 || self.kdf.parallelism == 0 {
            return Err(SealshareError::Config(
                "kdf costs must all be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum plaintext bytes per chunk. Every session sharing a file must
    /// use the same value.
    pub block_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { block_size: 4096 }
    }
}

/// Argon2id parameters for deriving the credential key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which backend the datastore and keystore live on
    pub backend: StorageBackend,
    /// S3-compatible endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket name
    pub bucket: String,
    /// Key prefix under which records and public keys are stored
    pub prefix: String,
    /// Refuse plaintext HTTP endpoints
    pub enforce_tls: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            endpoint: "http://localhost:8333".into(),
            region: "us-east-1".into(),
            bucket: "sealshare".into(),
            prefix: "sealshare".into(),
            enforce_tls: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info). `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}
