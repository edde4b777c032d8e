//! Start-up configuration: a TOML file layered with `USER_SESSION__*` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
