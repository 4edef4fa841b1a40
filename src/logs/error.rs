use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the log engine's synchronous entry points.
///
/// Errors hit inside a running tail's poll loop are never surfaced here;
/// they are logged and the tick is skipped so a stream survives transient
/// conditions like log rotation.
#[derive(Debug, Error)]
pub enum LogsError {
    #[error("log file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Caller asked to read from beyond the end of the file.
    #[error("invalid read offset {offset} (file size {size})")]
    InvalidOffset { offset: u64, size: u64 },

    #[error("invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to read log file: {0}")]
    ReadFailure(#[from] std::io::Error),
}

impl LogsError {
    /// Map an open/stat error: missing file gets the dedicated variant,
    /// anything else is a read failure.
    pub(crate) fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            LogsError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LogsError::ReadFailure(err)
        }
    }
}
