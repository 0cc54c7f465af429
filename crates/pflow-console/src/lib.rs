//! pflow Console
//!
//! Terminal stand-in for the flow designer and the work-order dashboard. It
//! only consumes the query modules: everything it shows comes from the cache
//! store, everything it writes goes through a mutation.

pub mod cli;
pub mod config;
pub mod console;
pub mod render;

pub use cli::{Cli, Command};
pub use config::{ConsoleConfig, ConsoleConfigError};
pub use console::Console;
