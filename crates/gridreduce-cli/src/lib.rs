pub mod cli;
pub mod config;

pub use cli::{Cli, Commands, InspectFormat, ModeArg};
pub use config::Config;
