//! Registration and login
//!
//! A `Client` binds a datastore, a keystore, and the protocol settings.
//! `register` and `login` both produce a `User` session.

use std::sync::Arc;

use secrecy::SecretString;

use sealshare_core::config::{ClientConfig, SealshareConfig};
use sealshare_core::{SealshareError, SealshareResult};
use sealshare_crypto::ids::user_record_id;
use sealshare_crypto::{
    derive_credential_keys, open, EncryptionSecretKey, KdfParams, RecordKeys, SigningSecretKey,
};
use sealshare_storage::{Datastore, Keystore};

use crate::records::{decode, put_sealed, UserRecord};
use crate::session::{encryption_key_name, verification_key_name, User};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Entry point: owns the backends every session talks to.
#[derive(Clone)]
pub struct Client {
    datastore: Arc<dyn Datastore>,
    keystore: Arc<dyn Keystore>,
    config: ClientConfig,
    kdf: KdfParams,
}

impl Client {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        keystore: Arc<dyn Keystore>,
        config: &SealshareConfig,
    ) -> SealshareResult<Self> {
        config.validate()?;
        Ok(Self {
            datastore,
            keystore,
            config: config.client.clone(),
            kdf: KdfParams::from(&config.kdf),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a new user and return a session for it.
    ///
    /// Fails with `Input` for an empty username and `Conflict` if the name is
    /// already taken. The password may be empty.
    pub fn register(&self, username: &str, password: &str) -> SealshareResult<User> {
        if username.is_empty() {
            return Err(SealshareError::Input("username must not be empty".into()));
        }

        let record_id = user_record_id(username);
        if self.datastore.get(record_id)?.is_some()
            || self.keystore.lookup(&encryption_key_name(username))?.is_some()
            || self.keystore.lookup(&verification_key_name(username))?.is_some()
        {
            return Err(SealshareError::Conflict(format!(
                "user already exists: {username}"
            )));
        }

        let record = UserRecord {
            username: username.to_string(),
            encryption_key: EncryptionSecretKey::generate(),
            signing_key: SigningSecretKey::generate(),
            file_keys: RecordKeys::generate(),
            share_tree_keys: RecordKeys::generate(),
        };

        let password = SecretString::from(password.to_owned());
        let credential_keys = derive_credential_keys(username, &password, &self.kdf)?;

        self.keystore.publish(
            &encryption_key_name(username),
            record.encryption_key.public_key().as_bytes().to_vec(),
        )?;
        self.keystore.publish(
            &verification_key_name(username),
            record.signing_key.verifying_key().as_bytes().to_vec(),
        )?;
        put_sealed(self.datastore.as_ref(), record_id, &credential_keys, &record)?;

        tracing::info!(user = %username, "registered user");
        Ok(self.session(record))
    }

    /// Open a session for an existing user.
    ///
    /// Unknown user, wrong password and a tampered record all fail with the
    /// same `Auth` error.
    pub fn login(&self, username: &str, password: &str) -> SealshareResult<User> {
        if username.is_empty() {
            return Err(SealshareError::Input("username must not be empty".into()));
        }

        let password = SecretString::from(password.to_owned());
        let credential_keys = derive_credential_keys(username, &password, &self.kdf)?;

        let invalid = || SealshareError::Auth(INVALID_CREDENTIALS.into());
        let blob = self
            .datastore
            .get(user_record_id(username))?
            .ok_or_else(invalid)?;
        let plaintext = open(&credential_keys, &blob).map_err(|_| invalid())?;
        let record: UserRecord = decode(&plaintext, "user record").map_err(|_| invalid())?;
        if record.username != username {
            return Err(invalid());
        }

        tracing::info!(user = %username, "logged in");
        Ok(self.session(record))
    }

    fn session(&self, record: UserRecord) -> User {
        User::new(
            record,
            Arc::clone(&self.datastore),
            Arc::clone(&self.keystore),
            self.config.block_size,
        )
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("kdf", &self.kdf)
            .finish_non_exhaustive()
    }
}
