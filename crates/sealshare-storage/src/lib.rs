//! sealshare-storage: the untrusted backends the client talks to
//!
//! Two collaborators, both passed into the client explicitly:
//!   - `Datastore`: opaque 128-bit id → bytes, last writer wins
//!   - `Keystore`: append-only directory of published public keys
//!
//! Implementations: in-memory (tests, embedding) and OpenDAL (memory or S3).

pub mod backend;
pub mod health;
pub mod memory;
pub mod operator;

pub use backend::{Datastore, Keystore};
pub use health::check_health;
pub use memory::{MemoryDatastore, MemoryKeystore};
pub use operator::{build_operator, OpendalBackend, S3Credentials};
