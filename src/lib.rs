// Task tracker - tasks kept in a single local JSON document

pub mod config;
pub mod error;
pub mod models;
pub mod record;
pub mod service;
pub mod store;
pub mod table;

// Re-export main types for convenience
pub use config::Config;
pub use error::{ErrorKind, Result, TaskError};
pub use models::{Status, Task};
pub use record::Record;
pub use service::{Outcome, TaskService};
pub use store::Store;
