//! Error types for vtoold operations.
//!
//! Every operation surfaces one [`VtoolError`]. Callers that only care about
//! the broad category can match on [`VtoolError::kind`].

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for vtoold operations.
pub type VtoolResult<T> = Result<T, VtoolError>;

/// Broad error categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A query produced no matching result.
    NotFound,
    /// External output did not have the expected shape.
    ParseError,
    /// The persisted store could not be reached or queried.
    StoreUnavailable,
    /// An external process could not start, timed out or exited abnormally.
    ExternalCommandFailed,
    /// A caller-supplied parameter is out of contract.
    InvalidArgument,
    /// The configuration file is unreadable or invalid.
    Config,
}

/// Errors that can occur during vtoold operations.
#[derive(Debug, Error)]
pub enum VtoolError {
    /// Nothing matched the lookup.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of what was looked up.
        what: String,
    },

    /// External output could not be parsed.
    #[error("Cannot parse {expected} from '{input}'")]
    Parse {
        /// What the parser was looking for.
        expected: &'static str,
        /// The offending input, possibly truncated.
        input: String,
    },

    /// Persisted store operation failed.
    #[error("Store unavailable: {operation}: {message}")]
    StoreUnavailable {
        /// The operation that failed (e.g., "get", "set").
        operation: String,
        /// Error message.
        message: String,
    },

    /// Failed to start an external program.
    #[error("Failed to execute '{command}': {source}")]
    CommandSpawn {
        /// The command that failed to start.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// External program returned a non-zero exit code.
    #[error("Command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code, -1 when killed by a signal.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// External program did not finish in time and was killed.
    #[error("Command timed out after {timeout:?}: '{command}'")]
    CommandTimeout {
        /// The command that was killed.
        command: String,
        /// The timeout that expired.
        timeout: Duration,
    },

    /// Caller-supplied parameter is invalid.
    #[error("Invalid {field}: {message}")]
    InvalidArgument {
        /// The offending parameter.
        field: String,
        /// Error message.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl VtoolError {
    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a parse error, keeping at most 128 bytes of the input.
    pub fn parse(expected: &'static str, input: &str) -> Self {
        let mut end = input.len().min(128);
        while !input.is_char_boundary(end) {
            end -= 1;
        }
        Self::Parse {
            expected,
            input: input[..end].to_string(),
        }
    }

    /// Creates a store error.
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VtoolError::NotFound { .. } => ErrorKind::NotFound,
            VtoolError::Parse { .. } => ErrorKind::ParseError,
            VtoolError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            VtoolError::CommandSpawn { .. }
            | VtoolError::CommandFailed { .. }
            | VtoolError::CommandTimeout { .. } => ErrorKind::ExternalCommandFailed,
            VtoolError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            VtoolError::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns true if this error means "nothing there" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
