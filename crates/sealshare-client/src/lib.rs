//! sealshare-client: encrypted file storage and sharing over an untrusted store
//!
//! ```text
//! Client::register / Client::login
//!   └── User session
//!         ├── store_file / append_to_file / load_file     (files)
//!         └── create_invitation / accept_invitation /
//!             revoke_access                               (sharing)
//! ```
//!
//! Every record is sealed before it reaches the `Datastore`. Ids are either
//! derived from names (users, file entries, sharing trees) or random
//! (chunks, indirection records, invitations), so the store learns nothing
//! beyond record sizes and access patterns.

mod client;
mod files;
mod records;
mod session;
mod sharing;

pub use client::Client;
pub use session::User;

pub use sealshare_core::config::SealshareConfig;
pub use sealshare_core::{RecordId, SealshareError, SealshareResult};
