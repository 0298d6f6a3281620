pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use error::{SealshareError, SealshareResult};
pub use types::RecordId;
