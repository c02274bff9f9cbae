use std::path::PathBuf;
use thiserror::Error;

/// Boxed decoder failure, carried inside [`ConfigError::ParseError`].
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("the candidate path '{0}' is not an absolute path")]
    NotAbsolutePath(PathBuf),

    #[error("config type '{0}' is not supported")]
    UnsupportedConfigType(String),

    #[error("the property source can't be empty")]
    EmptySource,

    #[error("the map of map property source '{0}' can't be empty")]
    EmptyMapSource(String),

    #[error("invalid success threshold: {0}")]
    InvalidThreshold(i64),

    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {format} config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        format: &'static str,
        source: DecodeError,
    },

    #[error("no decoder registered for suffix '{suffix}' (file '{path}')")]
    NoDecoder { suffix: String, path: PathBuf },

    #[error("suffix '{0}' is already claimed by another decoder")]
    DuplicateDecoder(String),

    #[error("failed to load all property sources: [{}]", join_messages(.0))]
    AllSourcesFailed(Vec<ConfigError>),
}

fn join_messages(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
