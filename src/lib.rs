pub mod cli;
pub mod generator;
pub mod github;
pub mod load_config;

pub use cli::{run, Cli, Commands};
