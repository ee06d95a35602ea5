//! The `logger` module is a thin wrapper over `tracing-subscriber` and is
//! checked by hand. See `bin/logger_demo.rs`.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
