//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("unknown orderbook: {0} (not on the active network)")]
    UnknownOrderbook(String),

    #[error("unknown deployment: {0} (not under the active orderbook)")]
    UnknownDeployment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
