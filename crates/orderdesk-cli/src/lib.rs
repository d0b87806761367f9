//! Command line interface for the orderdesk settings engine.

pub mod app;
pub mod error;
pub mod logging;

pub use app::{run, Args, Command};
pub use error::{AppError, AppResult};
