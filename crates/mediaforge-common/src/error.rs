//! Unified error type for mediaforge.
//!
//! Synchronous operations surface these directly to the caller. The HTTP
//! boundary derives a status code via [`Error::http_status`]; background
//! conversion failures are rendered with `Display` and stored on the task.

use std::fmt;

/// Error type covering every failure mode of the task engine and streamer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A source file, task, or path does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "task", "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The caller asked for something the core refuses to act on.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request is valid but the resource is not in a usable state yet.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The `Range` header could not be parsed.
    #[error("Malformed range: {0}")]
    MalformedRange(String),

    /// The `Range` header parsed but lies outside the resource.
    #[error("Range not satisfiable for resource of {size} bytes")]
    RangeNotSatisfiable {
        /// Total size of the resource in bytes.
        size: u64,
    },

    /// The external codec tool failed.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Captured diagnostic text.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::InvalidInput(_) => 400,
            Error::Conflict(_) => 409,
            Error::MalformedRange(_) => 400,
            Error::RangeNotSatisfiable { .. } => 416,
            Error::Tool { .. } => 502,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::InvalidInput(_) => "invalid_input",
            Error::Conflict(_) => "conflict",
            Error::MalformedRange(_) => "malformed_range",
            Error::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Error::Tool { .. } => "tool_error",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Convenience constructor for [`Error::Conflict`].
    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    /// Convenience constructor for [`Error::MalformedRange`].
    pub fn malformed_range(msg: impl Into<String>) -> Self {
        Error::MalformedRange(msg.into())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
