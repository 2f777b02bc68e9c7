// Runtime configuration

use std::path::{Path, PathBuf};

pub const DEFAULT_TASKS_FILE: &str = "tasks.json";
pub const DEFAULT_LOG_FILE: &str = "task-tracker.log";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Where tasks are stored and where diagnostics go.
///
/// Relative paths resolve against the working directory of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub tasks_path: PathBuf,
    pub log_path: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_path: PathBuf::from(DEFAULT_TASKS_FILE),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Default file names placed under `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            tasks_path: dir.join(DEFAULT_TASKS_FILE),
            log_path: dir.join(DEFAULT_LOG_FILE),
            ..Self::default()
        }
    }

    pub fn with_tasks_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.tasks_path = path.into();
        self
    }

    pub fn with_log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_path = path.into();
        self
    }

    pub fn with_log_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.log_filter = filter.into();
        self
    }
}
