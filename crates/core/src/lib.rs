// Meili Core - Task lifecycle, domain model & ports
// NO HTTP client dependency: transports are plugged in through `port::Transport`

pub mod application;
pub mod domain;
pub mod endpoints;
pub mod error;
pub mod port;

pub use error::{MeiliError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
