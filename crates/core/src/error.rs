//! Error types for vaultsync

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for vaultsync operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The rsync process could not be started at all
    #[error("failed to spawn {program}: {source}")]
    #[diagnostic(code(vaultsync::spawn))]
    Spawn {
        /// The program that could not be started
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited with a non-zero status
    #[error("{direction} failed with {status}: {stderr}")]
    #[diagnostic(code(vaultsync::process))]
    Process {
        /// Which sync direction was running
        direction: String,
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error output, verbatim
        stderr: String,
    },

    /// The process exceeded the wall-clock bound and was killed
    #[error("{direction} timed out after {seconds} seconds")]
    #[diagnostic(code(vaultsync::timeout))]
    Timeout {
        /// Which sync direction was running
        direction: String,
        /// The wall-clock bound in seconds
        seconds: u64,
    },

    /// Combined process output exceeded the buffer ceiling
    #[error("{direction} produced more than {limit} bytes of output")]
    #[diagnostic(code(vaultsync::output_overflow))]
    OutputOverflow {
        /// Which sync direction was running
        direction: String,
        /// The ceiling in bytes
        limit: usize,
    },

    /// The run was terminated by an explicit cancel() call
    #[error("{direction} cancelled")]
    #[diagnostic(code(vaultsync::cancelled))]
    Cancelled {
        /// Which sync direction was running
        direction: String,
    },

    /// A sync cycle is already in flight
    #[error("a sync is already running")]
    #[diagnostic(
        code(vaultsync::busy),
        help("wait for the current sync to finish or cancel it first")
    )]
    Busy,

    /// Configuration error
    #[error("configuration error: {message}")]
    #[diagnostic(code(vaultsync::config))]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(vaultsync::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable
        path: Option<Box<std::path::Path>>,
        /// Description of the operation that failed
        operation: String,
    },
}

impl Error {
    /// Create a configuration error with a message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }

    /// True when this error was caused by an explicit `cancel()` call
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result type for vaultsync operations
pub type Result<T> = std::result::Result<T, Error>;
