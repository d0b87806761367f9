//! Settings text parsing.
//!
//! The session treats the parser as an external collaborator behind the
//! `SettingsParser` trait; `YamlParser` is the built-in implementation.
//! Parse failures are never fatal upstream: the session settles the
//! document cell to the empty fallback and reports the message.

pub mod error;
pub mod parser;

pub use error::{ParseError, ParseResult};
pub use parser::{SettingsParser, YamlParser};
