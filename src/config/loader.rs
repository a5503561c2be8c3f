//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "env.yml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a YAML or TOML file.
///
/// Files ending in `.toml` are parsed as TOML, everything else as YAML.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_config(&content, is_toml(path))?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse configuration text. An empty document yields the defaults.
pub fn parse_config(content: &str, toml: bool) -> Result<ServerConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(ServerConfig::default());
    }
    if toml {
        Ok(toml::from_str(content)?)
    } else {
        Ok(serde_yaml::from_str(content)?)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "addr: 127.0.0.1:8123\ngraceful_timeout: 3").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.address, "127.0.0.1:8123");
        assert_eq!(config.graceful_timeout, 3);
        assert_eq!(config.timeout, 20);
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "address = \"127.0.0.1:8124\"\ntimeout = 7").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.address, "127.0.0.1:8124");
        assert_eq!(config.timeout, 7);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        assert_eq!(load_config(file.path()).unwrap(), ServerConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here/env.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse_config("timeout: [not a number", false).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "timeout: 0").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("`timeout` must be greater than zero"));
    }
}
