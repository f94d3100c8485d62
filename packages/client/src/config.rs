//! Client configuration, populated from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default transaction timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime configuration for node requests.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `VAMDC_TIMEOUT_SECS` | `25` | Seconds to wait for a node before giving up |
/// | `VAMDC_VERIFY_HTTPS` | `true` | Validate TLS certificates of `https` nodes |
/// | `VAMDC_NODES_FILE` | (absent) | JSON node list used to resolve node identifiers |
/// | `VAMDC_STRICT_SPECIES_LOOKUP` | `false` | Propagate failures of the node-local species-id attempt instead of falling back |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout: Duration,

    /// When `false`, certificates of `https` nodes are not validated.
    pub verify_https: bool,

    pub nodes_file: Option<PathBuf>,

    /// When `true`, a failure of the first (node-local id) attempt in
    /// [`get_species_data`](crate::get_species_data) is returned to the
    /// caller instead of being logged and replaced by the VAMDC species-id
    /// attempt.
    pub strict_species_lookup: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_https: true,
            nodes_file: None,
            strict_species_lookup: false,
        }
    }
}

impl ClientConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout = match lookup("VAMDC_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "VAMDC_TIMEOUT_SECS",
                expected: "a whole number of seconds",
                value: v.clone(),
            })?),
            None => defaults.timeout,
        };

        let verify_https = match lookup("VAMDC_VERIFY_HTTPS") {
            Some(v) => parse_flag("VAMDC_VERIFY_HTTPS", &v)?,
            None => defaults.verify_https,
        };

        let strict_species_lookup = match lookup("VAMDC_STRICT_SPECIES_LOOKUP") {
            Some(v) => parse_flag("VAMDC_STRICT_SPECIES_LOOKUP", &v)?,
            None => defaults.strict_species_lookup,
        };

        Ok(Self {
            timeout,
            verify_https,
            nodes_file: lookup("VAMDC_NODES_FILE")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            strict_species_lookup,
        })
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a boolean (true/false)",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]).unwrap(), ClientConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("VAMDC_TIMEOUT_SECS", "5"),
            ("VAMDC_VERIFY_HTTPS", "false"),
            ("VAMDC_NODES_FILE", "/etc/vamdc/nodes.json"),
            ("VAMDC_STRICT_SPECIES_LOOKUP", "yes"),
        ])
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.verify_https);
        assert_eq!(config.nodes_file, Some(PathBuf::from("/etc/vamdc/nodes.json")));
        assert!(config.strict_species_lookup);
    }

    #[test]
    fn malformed_timeout_is_an_error() {
        assert!(matches!(
            config_from(&[("VAMDC_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid { var: "VAMDC_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn malformed_flag_is_an_error() {
        assert!(config_from(&[("VAMDC_VERIFY_HTTPS", "maybe")]).is_err());
    }
}
