use miette::Diagnostic;
use thiserror::Error;

/// Result type for snapshot loading and CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the surrounding tool surface.
///
/// The analysis core never produces these: uncertainty inside the analysis is
/// represented as data (`ThrowState::Unknown`), not as an error. Everything
/// here belongs to the snapshot loader and the CLI.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum Error {
    #[error("I/O error: {0}")]
    #[diagnostic(code(throw_trace::io_error))]
    Io(String),

    #[error("Invalid snapshot JSON: {message}")]
    #[diagnostic(code(throw_trace::invalid_snapshot))]
    Json { message: String },

    #[error("Unknown type name: {name}")]
    #[diagnostic(code(throw_trace::unknown_type))]
    UnknownType { name: String },

    #[error("Unknown function name: {name}")]
    #[diagnostic(code(throw_trace::unknown_function))]
    UnknownFunction { name: String },

    #[error("Duplicate type name: {name}")]
    #[diagnostic(code(throw_trace::duplicate_type))]
    DuplicateType { name: String },

    #[error("Duplicate function name: {name}")]
    #[diagnostic(code(throw_trace::duplicate_function))]
    DuplicateFunction { name: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(throw_trace::internal_error))]
    Internal { message: String },
}

impl Error {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
