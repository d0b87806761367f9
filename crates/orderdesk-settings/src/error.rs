//! Parser error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid settings yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("settings parser unavailable: {0}")]
    Unavailable(String),
}

pub type ParseResult<T> = Result<T, ParseError>;
