//! Error types for loading implementor indexes.

/// Failure reported by an [`ImplementorSink`](crate::sink::ImplementorSink).
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Implementor index errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The file does not have the implementor index shape.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A package is assigned twice in the same file.
    #[error("duplicate package {package:?} at line {line}")]
    DuplicatePackage { package: String, line: usize },

    /// Reading a file or directory failed.
    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },

    /// File exceeds the configured read limit.
    #[error("{path} is {size} bytes, limit is {limit}")]
    TooLarge { path: String, size: u64, limit: u64 },

    /// File location does not name a trait.
    #[error("invalid trait path {path}: {reason}")]
    InvalidTraitPath { path: String, reason: String },

    /// The sink rejected a delivered index.
    #[error("sink rejected index{}: {source}", trait_label(.trait_path))]
    Sink {
        trait_path: Option<String>,
        #[source]
        source: SinkError,
    },

    /// JSON (de)serialization failed.
    #[error("json error: {message}")]
    Json { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

fn trait_label(trait_path: &Option<String>) -> String {
    match trait_path {
        Some(path) => format!(" for {path}"),
        None => String::new(),
    }
}

impl IndexError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Input / config issues
            Self::Io { .. } => 2,
            Self::TooLarge { .. } => 2,
            Self::InvalidTraitPath { .. } => 2,
            Self::Config { .. } => 2,
            Self::Json { .. } => 2,
            Self::Sink { .. } => 2,

            // Malformed index files
            Self::Parse { .. } => 3,
            Self::DuplicatePackage { .. } => 3,
        }
    }

    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_error_names_trait_when_known() {
        let err = IndexError::Sink {
            trait_path: Some("core::ops::bit::Shl".to_string()),
            source: "viewer not ready".into(),
        };
        assert_eq!(
            err.to_string(),
            "sink rejected index for core::ops::bit::Shl: viewer not ready"
        );

        let anonymous = IndexError::Sink {
            trait_path: None,
            source: "boom".into(),
        };
        assert_eq!(anonymous.to_string(), "sink rejected index: boom");
    }

    #[test]
    fn exit_codes_group_by_cause() {
        assert_eq!(IndexError::parse(1, 1, "x").exit_code(), 3);
        assert_eq!(
            IndexError::Config {
                message: "bad".into()
            }
            .exit_code(),
            2
        );
        let sink = IndexError::Sink {
            trait_path: None,
            source: "consumer gone".into(),
        };
        assert_eq!(sink.exit_code(), 2);
    }
}
