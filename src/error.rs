// Error types for task operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskError>;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a task operation. The collection is never modified when one
/// of these is returned.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Missing argument, unknown status, or an id that does not exist
    #[error("{0}")]
    Validation(String),

    /// Storage location unreadable or holding malformed data
    #[error("Error reading {}", .path.display())]
    Read { path: PathBuf, source: Source },

    /// Storage location could not be written
    #[error("Error writing {}", .path.display())]
    Write { path: PathBuf, source: Source },
}

/// Failure class of a [`TaskError`], for callers that branch on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Read,
    Write,
}

impl TaskError {
    pub fn validation(message: impl Into<String>) -> Self {
        TaskError::Validation(message.into())
    }

    pub fn read(path: impl Into<PathBuf>, source: impl Into<Source>) -> Self {
        TaskError::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: impl Into<Source>) -> Self {
        TaskError::Write {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::Validation(_) => ErrorKind::Validation,
            TaskError::Read { .. } => ErrorKind::Read,
            TaskError::Write { .. } => ErrorKind::Write,
        }
    }
}
