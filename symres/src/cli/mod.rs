//! Command-line interface and run configuration

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{parse_uint, EngineKind, RunConfig};
