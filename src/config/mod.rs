// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::cli::Args;
use crate::error::{GatewayError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest, see [`AppConfig::apply_args`])
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists
            .add_source(File::from(file).required(path.is_some()))
            // Override with environment variables (SPEECH_GATEWAY__BACKEND__ENDPOINT=...)
            .add_source(
                Environment::with_prefix("SPEECH_GATEWAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Overlay explicitly passed command line flags.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(listen_addr) = &args.listen_addr {
            self.server.listen_addr = listen_addr.clone();
        }
        if let Some(network) = &args.network {
            self.backend.network = network.clone();
        }
        if let Some(endpoint) = &args.endpoint {
            self.backend.endpoint = endpoint.clone();
        }
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".speech-gateway")
            .join("config.toml")
    }
}
