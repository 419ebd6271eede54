//! Error types for sqlunit

use thiserror::Error;

/// The result type for sqlunit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing a specification or loading its inputs
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed specification file
    #[error("Syntax error in {file} line {line}: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    /// An `INCLUDE` directive referenced a query file that was not supplied
    #[error("Included query file not loaded: {path}")]
    MissingInclude { path: String },

    /// The backend selector did not name a supported dialect
    #[error("Unsupported database dialect: {0}")]
    UnknownDialect(String),

    /// An included query file could not be read from disk
    #[error("Cannot read included query file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl Error {
    /// Create a syntax error carrying the file name and 1-based line number
    pub fn syntax(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a missing-include error
    pub fn missing_include(path: impl Into<String>) -> Self {
        Error::MissingInclude { path: path.into() }
    }

    /// Create an unknown-dialect error
    pub fn unknown_dialect(name: impl Into<String>) -> Self {
        Error::UnknownDialect(name.into())
    }
}
