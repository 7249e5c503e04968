// Configuration management module
// TOML settings file plus environment-provided API credential

pub mod settings;

pub use settings::{
    ChunkingConfig, Config, ConfigError, OpenAiConfig, RetrievalConfig, ServerConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
