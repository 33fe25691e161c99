//! Loader configuration.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};
use crate::parse::ParseOptions;

/// Default per-file read limit (16 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Settings shared by every load operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Require the dispatch trailer in every file.
    #[serde(default = "default_strict")]
    pub strict: bool,

    /// Refuse to read files larger than this.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_strict() -> bool {
    true
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strict: default_strict(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl LoaderConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `IMPLINDEX_STRICT` | Require the dispatch trailer (default: true) |
    /// | `IMPLINDEX_MAX_FILE_BYTES` | Per-file read limit (default: 16 MiB) |
    pub fn from_env() -> Self {
        Self {
            strict: std::env::var("IMPLINDEX_STRICT")
                .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
                .unwrap_or_else(|_| default_strict()),
            max_file_bytes: std::env::var("IMPLINDEX_MAX_FILE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_file_bytes),
        }
    }

    /// Set strict trailer checking.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the per-file read limit.
    pub fn with_max_file_bytes(mut self, limit: u64) -> Self {
        self.max_file_bytes = limit;
        self
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict: self.strict,
        }
    }

    /// Reject settings no load could succeed with.
    pub fn validate(&self) -> IndexResult<()> {
        if self.max_file_bytes == 0 {
            return Err(IndexError::Config {
                message: "max_file_bytes must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert!(config.strict);
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = LoaderConfig::default()
            .with_strict(false)
            .with_max_file_bytes(0);
        assert!(!config.parse_options().strict);
        assert!(matches!(config.validate(), Err(IndexError::Config { .. })));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: LoaderConfig = serde_json::from_str(r#"{"strict": false}"#).unwrap();
        assert!(!config.strict);
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
    }
}
