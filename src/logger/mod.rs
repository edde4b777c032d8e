//! Process-wide `tracing` subscriber. Tokens are logged by fingerprint only.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
