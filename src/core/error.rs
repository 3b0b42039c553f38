/// Error taxonomy for the backup core
///
/// Registry and parser failures are plain value-returning errors; subprocess
/// failures carry the exit code and stderr so callers can present them.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An instance with the same id already exists
    #[error("instance '{0}' already exists")]
    Conflict(String),

    /// No instance registered under this id
    #[error("instance '{0}' not found")]
    NotFound(String),

    /// The backup tool exited non-zero, or produced stderr-only output
    #[error("backup tool exited with code {code}: {stderr}")]
    Execution { code: i32, stderr: String },

    /// The backup tool did not finish within the configured timeout
    #[error("backup tool timed out after {0:?}")]
    Timeout(Duration),

    /// Structurally impossible input (non-UTF-8 output, malformed cron)
    #[error("parse error: {0}")]
    Parse(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
