//! Client configuration.
//!
//! Options can be built in code or loaded from TOML:
//!
//! ```toml
//! id_prefix = "c"
//! default_timeout_ms = 2000
//!
//! [[errors]]
//! code = 20
//! name = "key-does-not-exist"
//! definite = true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use tether_core::ErrorSpec;

/// How long `recv` and `rpc` wait when no timeout is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    /// Error definitions merged over the common table.
    pub errors: Vec<ErrorSpec>,
    #[serde(rename = "default_timeout_ms", deserialize_with = "millis")]
    pub default_timeout: Duration,
    /// Prefix for generated node ids.
    pub id_prefix: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            default_timeout: DEFAULT_TIMEOUT,
            id_prefix: "c".to_string(),
        }
    }
}

impl ClientOptions {
    pub fn with_error(mut self, spec: ErrorSpec) -> Self {
        self.errors.push(spec);
        self
    }

    pub fn with_errors(mut self, specs: impl IntoIterator<Item = ErrorSpec>) -> Self {
        self.errors.extend(specs);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

fn millis<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    u64::deserialize(d).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::errors::KEY_DOES_NOT_EXIST;

    #[test]
    fn defaults() {
        let options = ClientOptions::default();
        assert!(options.errors.is_empty());
        assert_eq!(options.default_timeout, Duration::from_secs(5));
        assert_eq!(options.id_prefix, "c");
    }

    #[test]
    fn parse_toml() {
        let options = ClientOptions::from_toml_str(
            r#"
            default_timeout_ms = 250

            [[errors]]
            code = 20
            name = "key-does-not-exist"
            definite = true
            "#,
        )
        .unwrap();

        assert_eq!(options.default_timeout, Duration::from_millis(250));
        assert_eq!(options.errors, vec![KEY_DOES_NOT_EXIST]);
        assert_eq!(options.id_prefix, "c");
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ClientOptions::from_toml_str("timeout = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file() {
        let err = ClientOptions::load("/nonexistent/tether.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
