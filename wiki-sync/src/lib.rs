pub mod cli;
pub mod gateway;
pub mod load_config;

pub use cli::{run, Cli, Commands};
