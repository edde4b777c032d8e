mod auth_service;
mod credential_hasher;
mod session_manager;
mod token_codec;

pub use auth_service::*;
pub use credential_hasher::*;
pub use session_manager::*;
pub use token_codec::*;
