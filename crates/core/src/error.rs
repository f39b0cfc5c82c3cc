//! Error types for slide deck annotation.
//!
//! The annotator itself cannot fail; these cover the layers around it that
//! read files and configuration.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading documents or project configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read, or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The input is not valid UTF-8 text.
    #[error("Invalid text encoding in {0}")]
    InvalidEncoding(String),

    /// The project configuration could not be parsed or is inconsistent.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}
