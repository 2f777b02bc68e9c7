// Task operations over the store

use crate::config::Config;
use crate::error::{Result, TaskError};
use crate::models::{self, Status, Task};
use crate::record;
use crate::store::Store;
use crate::table;
use std::error::Error as _;
use std::fmt;
use tracing::{error, info};

/// Result of a successful operation.
///
/// `NoTasks` and `NoTasksWithStatus` are informational: nothing failed,
/// there is just nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added { id: String },
    Updated { id: String },
    Deleted { id: String },
    Marked { id: String, status: Status },
    Tasks(Vec<Task>),
    NoTasks,
    NoTasksWithStatus(Status),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Added { id } => write!(f, "Output: Task added successfully (ID: {})", id),
            Outcome::Updated { id } => write!(f, "Output: Task updated successfully (ID: {})", id),
            Outcome::Deleted { id } => write!(f, "Output: Task deleted successfully (ID: {})", id),
            Outcome::Marked { id, status } => write!(f, "Output: Task marked as {} (ID: {})", status, id),
            Outcome::Tasks(tasks) => f.write_str(&table::render(tasks, false)),
            Outcome::NoTasks => write!(f, "No tasks found."),
            Outcome::NoTasksWithStatus(status) => write!(f, "No tasks with status: {}", status),
        }
    }
}

/// The user-facing task operations.
///
/// Each mutation is one read-modify-write of the whole collection under
/// the store lock. Errors are logged here and returned as values.
#[derive(Debug, Clone)]
pub struct TaskService {
    store: Store,
}

impl TaskService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Store::from_config(config))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create a `todo` task with the next free id
    pub fn add(&self, description: &str) -> Result<Outcome> {
        logged("add", self.try_add(description))
    }

    /// Replace a task's description
    pub fn update(&self, id: &str, description: &str) -> Result<Outcome> {
        logged("update", self.try_update(id, description))
    }

    pub fn delete(&self, id: &str) -> Result<Outcome> {
        logged("delete", self.try_delete(id))
    }

    pub fn mark_in_progress(&self, id: &str) -> Result<Outcome> {
        self.mark(id, Status::InProgress)
    }

    pub fn mark_done(&self, id: &str) -> Result<Outcome> {
        self.mark(id, Status::Done)
    }

    /// Set a task's status. Any status may follow any other.
    pub fn mark(&self, id: &str, status: Status) -> Result<Outcome> {
        logged("mark", self.try_mark(id, status))
    }

    /// All tasks, or those whose status is exactly `status_filter`
    pub fn list(&self, status_filter: Option<&str>) -> Result<Outcome> {
        logged("list", self.try_list(status_filter))
    }

    fn try_add(&self, description: &str) -> Result<Outcome> {
        if description.trim().is_empty() {
            return Err(TaskError::validation("Task name cannot be empty"));
        }

        let _lock = self.store.lock()?;
        let mut tasks: Vec<Task> = self.store.read_all()?;

        let id = next_id(&tasks)?.to_string();
        record::upsert(&mut tasks, Task::new(id.clone(), description, models::now()));
        self.store.write_all(&tasks)?;

        info!(id = %id, "Task added");
        Ok(Outcome::Added { id })
    }

    fn try_update(&self, id: &str, description: &str) -> Result<Outcome> {
        if id.trim().is_empty() || description.trim().is_empty() {
            return Err(TaskError::validation("Task name and id are required"));
        }

        let _lock = self.store.lock()?;
        let mut tasks: Vec<Task> = self.store.read_all()?;

        let index = find(&tasks, id)?;
        let task = &mut tasks[index];
        task.description = description.to_string();
        task.updated_at = models::now();
        self.store.write_all(&tasks)?;

        info!(id, "Task updated");
        Ok(Outcome::Updated { id: id.to_string() })
    }

    fn try_delete(&self, id: &str) -> Result<Outcome> {
        require_id(id)?;

        let _lock = self.store.lock()?;
        let mut tasks: Vec<Task> = self.store.read_all()?;

        let index = find(&tasks, id)?;
        tasks.remove(index);
        self.store.write_all(&tasks)?;

        info!(id, "Task deleted");
        Ok(Outcome::Deleted { id: id.to_string() })
    }

    fn try_mark(&self, id: &str, status: Status) -> Result<Outcome> {
        require_id(id)?;

        let _lock = self.store.lock()?;
        let mut tasks: Vec<Task> = self.store.read_all()?;

        let index = find(&tasks, id)?;
        let task = &mut tasks[index];
        task.status = status;
        task.updated_at = models::now();
        self.store.write_all(&tasks)?;

        info!(id, %status, "Task status changed");
        Ok(Outcome::Marked {
            id: id.to_string(),
            status,
        })
    }

    fn try_list(&self, status_filter: Option<&str>) -> Result<Outcome> {
        let status = status_filter.map(str::parse::<Status>).transpose()?;
        let tasks: Vec<Task> = self.store.read_all()?;

        if tasks.is_empty() {
            info!("No tasks found");
            return Ok(Outcome::NoTasks);
        }

        let Some(status) = status else {
            return Ok(Outcome::Tasks(tasks));
        };

        let matching: Vec<Task> = tasks.into_iter().filter(|task| task.status == status).collect();
        if matching.is_empty() {
            info!(%status, "No tasks with status");
            return Ok(Outcome::NoTasksWithStatus(status));
        }

        Ok(Outcome::Tasks(matching))
    }
}

/// One more than the largest numeric id, or 1 for an empty collection
pub fn next_id(tasks: &[Task]) -> Result<u64> {
    match tasks.iter().filter_map(Task::numeric_id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| TaskError::validation(format!("No ids left after {}", max))),
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(TaskError::validation("Task Id should be present"));
    }
    Ok(())
}

fn find(tasks: &[Task], id: &str) -> Result<usize> {
    if tasks.is_empty() {
        return Err(TaskError::validation(format!("No Tasks found with id: {}", id)));
    }
    record::position(tasks, id).ok_or_else(|| TaskError::validation(format!("Task with ID {} not found", id)))
}

fn logged(operation: &str, result: Result<Outcome>) -> Result<Outcome> {
    if let Err(e) = &result {
        let cause = e.source().map(|source| source.to_string());
        error!(operation, kind = ?e.kind(), error = %e, ?cause, "Task operation failed");
    }
    result
}
