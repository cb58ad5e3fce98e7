//! Service configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Service configuration, loaded from YAML with CLI overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the trained model artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    /// How many ranked contributions an explanation returns when the
    /// request does not say
    #[serde(default = "default_top_features")]
    pub default_top_features: usize,
}

impl ServiceConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(artifacts) = &cli.artifacts {
            config.artifacts_dir = artifacts.clone();
        }
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }

        Ok(config)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            artifacts_dir: default_artifacts_dir(),
            default_top_features: default_top_features(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_artifacts_dir() -> String {
    "./artifacts".to_string()
}

fn default_top_features() -> usize {
    cardiorisk_predictor::DEFAULT_TOP_FEATURES
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn bare_cli() -> Cli {
        Cli::parse_from(["cardiorisk-api"])
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ServiceConfig::load("/nonexistent/config.yaml", &bare_cli()).unwrap();
        assert_eq!(config.listen, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.artifacts_dir, "./artifacts");
        assert_eq!(config.default_top_features, 5);
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "port: 9000\nartifacts_dir: /var/lib/cardiorisk\n").unwrap();

        let config = ServiceConfig::load(path.to_str().unwrap(), &bare_cli()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.artifacts_dir, "/var/lib/cardiorisk");
        // Unset keys keep their defaults
        assert_eq!(config.listen, "0.0.0.0");
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "port: 9000\n").unwrap();

        let cli = Cli::parse_from([
            "cardiorisk-api",
            "--port",
            "7777",
            "--artifacts",
            "/tmp/models",
        ]);
        let config = ServiceConfig::load(path.to_str().unwrap(), &cli).unwrap();
        assert_eq!(config.port, 7777);
        assert_eq!(config.artifacts_dir, "/tmp/models");
    }
}
