// Identity trait for storable records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Core trait that any record kept in a collection must implement
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone {
    /// Unique identifier within the collection
    fn id(&self) -> &str;

    /// When this record was last modified
    fn updated_at(&self) -> DateTime<Utc>;
}

impl Record for crate::models::Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Insert-or-replace by id.
///
/// A record whose id is already present replaces the existing one at the
/// same position; otherwise it is appended. Returns true if it replaced.
pub fn upsert<T: Record>(collection: &mut Vec<T>, record: T) -> bool {
    match collection.iter().position(|existing| existing.id() == record.id()) {
        Some(index) => {
            collection[index] = record;
            true
        }
        None => {
            collection.push(record);
            false
        }
    }
}

/// Position of the record with `id`, if any
pub fn position<T: Record>(collection: &[T], id: &str) -> Option<usize> {
    collection.iter().position(|record| record.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Status, Task};
    use chrono::TimeZone;

    fn task(id: &str, description: &str) -> Task {
        Task::new(id, description, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn test_upsert_appends_new_id() {
        let mut tasks = vec![task("1", "a")];

        let replaced = upsert(&mut tasks, task("2", "b"));

        assert!(!replaced);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].id, "2");
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut tasks = vec![task("1", "a"), task("2", "b"), task("3", "c")];

        let mut changed = task("2", "b changed");
        changed.status = Status::Done;
        let replaced = upsert(&mut tasks, changed);

        assert!(replaced);
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[1].description, "b changed");
        assert_eq!(tasks[1].status, Status::Done);
        assert_eq!(tasks[2].id, "3");
    }

    #[test]
    fn test_upsert_twice_keeps_single_record() {
        let mut tasks = vec![task("1", "a"), task("2", "b")];

        upsert(&mut tasks, task("1", "a"));
        upsert(&mut tasks, task("1", "a"));

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks.iter().filter(|t| t.id == "1").count(), 1);
        assert_eq!(position(&tasks, "1"), Some(0));
    }

    #[test]
    fn test_position() {
        let tasks = vec![task("4", "a"), task("9", "b")];
        assert_eq!(position(&tasks, "9"), Some(1));
        assert_eq!(position(&tasks, "5"), None);
    }
}
