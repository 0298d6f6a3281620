//! Key derivation: username + password → credential keys (Argon2id, then HKDF)

use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use sealshare_core::config::KdfConfig;
use sealshare_core::{SealshareError, SealshareResult};

use crate::ids::hash;
use crate::keys::{RecordKeys, SymmetricKey};
use crate::KEY_SIZE;

/// Argon2id parameters for KDF
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl From<&KdfConfig> for KdfParams {
    fn from(cfg: &KdfConfig) -> Self {
        Self {
            mem_cost_kib: cfg.mem_cost_kib,
            time_cost: cfg.time_cost,
            parallelism: cfg.parallelism,
        }
    }
}

/// Derive the keys that seal a user's record from their credentials.
///
/// The Argon2id input is `SHA-256(username) || SHA-256(password)`; the salt is
/// derived from the username alone so that any session can recompute it. The
/// 256-bit output is split by HKDF into independent encryption and MAC keys.
pub fn derive_credential_keys(
    username: &str,
    password: &SecretString,
    params: &KdfParams,
) -> SealshareResult<RecordKeys> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| SealshareError::Crypto(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut input = Zeroizing::new(Vec::with_capacity(64));
    input.extend_from_slice(&hash(username.as_bytes()));
    input.extend_from_slice(&hash(password.expose_secret().as_bytes()));

    let mut salt_input = b"sealshare-user-salt".to_vec();
    salt_input.extend_from_slice(username.as_bytes());
    let salt = hash(&salt_input);

    let mut master = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(&input, &salt[..16], &mut master[..])
        .map_err(|e| SealshareError::Crypto(format!("Argon2id KDF failed: {e}")))?;

    let master = SymmetricKey::from_bytes(*master);
    Ok(RecordKeys {
        enc: master.derive(b"sealshare-user-enc")?,
        mac: master.derive(b"sealshare-user-mac")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_kdf_deterministic() {
        let pw = SecretString::from("test-passphrase-123");
        let k1 = derive_credential_keys("alice", &pw, &fast()).unwrap();
        let k2 = derive_credential_keys("alice", &pw, &fast()).unwrap();

        assert_eq!(k1.enc.as_bytes(), k2.enc.as_bytes(), "KDF must be deterministic");
        assert_eq!(k1.mac.as_bytes(), k2.mac.as_bytes());
    }

    #[test]
    fn test_kdf_different_passwords() {
        let k1 = derive_credential_keys("alice", &SecretString::from("pw-a"), &fast()).unwrap();
        let k2 = derive_credential_keys("alice", &SecretString::from("pw-b"), &fast()).unwrap();
        assert_ne!(k1.enc.as_bytes(), k2.enc.as_bytes());
    }

    #[test]
    fn test_kdf_different_usernames() {
        let pw = SecretString::from("same");
        let k1 = derive_credential_keys("alice", &pw, &fast()).unwrap();
        let k2 = derive_credential_keys("bob", &pw, &fast()).unwrap();
        assert_ne!(k1.enc.as_bytes(), k2.enc.as_bytes());
    }

    #[test]
    fn test_enc_and_mac_keys_independent() {
        let keys = derive_credential_keys("alice", &SecretString::from("pw"), &fast()).unwrap();
        assert_ne!(keys.enc.as_bytes(), keys.mac.as_bytes());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = KdfParams {
            mem_cost_kib: 1,
            time_cost: 1,
            parallelism: 1,
        };
        let result = derive_credential_keys("alice", &SecretString::from("pw"), &params);
        assert!(matches!(result, Err(SealshareError::Crypto(_))));
    }
}
