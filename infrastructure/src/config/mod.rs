//! Configuration loading and schema

pub mod file_config;
pub mod loader;

pub use file_config::{ApiConfig, ArbiterConfig, FileConfig, LimitsConfig, SolversConfig};
pub use loader::ConfigLoader;
