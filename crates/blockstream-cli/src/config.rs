use blockstream_parser::ParserConfig;
use blockstream_session::SessionConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Characters per replayed fragment when chunking a markdown file
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_chunk_size() -> usize {
    16
}

fn default_channel_capacity() -> usize {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// `json` or `pretty`
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. the explicit file passed on the command line
    /// 4. Environment variables (BLOCKSTREAM_STREAM__CHUNK_SIZE=8, ...)
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("BLOCKSTREAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig::new()
            .with_parser(self.parser.clone())
            .with_channel_capacity(self.stream.channel_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [parser]
            paragraph_blocks = true

            [stream]
            chunk_size = 4
            channel_capacity = 64

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.parser.paragraph_blocks);
        assert!(!config.parser.preview_partial_lines);
        assert_eq!(config.stream.chunk_size, 4);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.session().channel_capacity, 64);
    }

    #[test]
    fn test_sections_are_optional() {
        let config: Config = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.stream.chunk_size, 16);
        assert_eq!(config.stream.channel_capacity, 1000);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[stream]\nchunk_size = 2").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.stream.chunk_size, 2);
        assert_eq!(config.logging.level, "info");
    }
}
