//! Settings come from a TOML file layered with `TOKENWARDEN__*` environment
//! variables. See `bin/settings_demo.rs` for a manual walkthrough.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
