//! Command-line configuration.

mod cli;

pub use cli::{Cli, Commands};
