pub mod config;

pub use config::{Config, LoggingConfig, StreamConfig};
