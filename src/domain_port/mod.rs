// store

mod kv_store;
mod request_context;

pub use kv_store::*;
pub use request_context::*;

// repo

mod user_directory;

pub use user_directory::*;

mod clock;

pub use clock::*;
