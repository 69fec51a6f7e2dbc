//! Error types for the CLI

use std::path::PathBuf;

use core_types::VmError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read
    #[error("could not read '{}': {source}", .path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The configuration or program image was rejected before execution
    #[error("{0}")]
    Load(VmError),

    /// The program faulted while running
    #[error("fault: {0}")]
    Fault(VmError),
}

impl CliError {
    /// Process exit status for this error: the fault's diagnostic code for
    /// runtime faults, 1 for everything that happens before execution.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Fault(err) => err.code() as i32,
            CliError::Io { .. } | CliError::Load(_) => 1,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
