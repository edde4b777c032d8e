//! Process-local backends: single-node development and tests.

mod kv_store_memory;
mod manual_clock;
mod user_directory_memory;

pub use kv_store_memory::*;
pub use manual_clock::*;
pub use user_directory_memory::*;
