pub mod backend;
pub mod cli;
pub mod fs_store;
pub mod gcs;
pub mod load_config;

pub use cli::{run, Cli, Commands};
