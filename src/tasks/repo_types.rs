use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "Invalid status '{other}', expected one of: pending, completed"
            )),
        }
    }
}

/// A task as the rest of the crate sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Row shape in Postgres; `status` is stored as text.
#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub due_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse::<TaskStatus>()
            .map_err(|e| anyhow::anyhow!("task {} has corrupt status: {e}", r.id))?;
        Ok(Self {
            id: r.id,
            owner_id: r.owner_id,
            title: r.title,
            description: r.description,
            status,
            due_date: r.due_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Narrowing applied to a user's task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Only tasks due on or before this date; undated tasks are excluded.
    pub due_on_or_before: Option<Date>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        match (self.due_on_or_before, task.due_date) {
            (None, _) => true,
            (Some(limit), Some(due)) => due <= limit,
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn task(status: TaskStatus, due_date: Option<Date>) -> Task {
        Task {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "t".into(),
            description: String::new(),
            status,
            due_date,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert_eq!("completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert!("Completed".parse::<TaskStatus>().is_err());
        assert!("in-progress".parse::<TaskStatus>().is_err());
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
    }

    #[test]
    fn due_date_filter_is_inclusive_and_drops_undated() {
        let f = TaskFilter {
            status: None,
            due_on_or_before: Some(date!(2024-01-15)),
        };
        assert!(f.matches(&task(TaskStatus::Pending, Some(date!(2024-01-10)))));
        assert!(f.matches(&task(TaskStatus::Pending, Some(date!(2024-01-15)))));
        assert!(!f.matches(&task(TaskStatus::Pending, Some(date!(2024-02-10)))));
        assert!(!f.matches(&task(TaskStatus::Pending, None)));
    }

    #[test]
    fn status_filter_is_exact() {
        let f = TaskFilter {
            status: Some(TaskStatus::Completed),
            due_on_or_before: None,
        };
        assert!(f.matches(&task(TaskStatus::Completed, None)));
        assert!(!f.matches(&task(TaskStatus::Pending, None)));
        assert!(TaskFilter::default().matches(&task(TaskStatus::Pending, None)));
    }

    #[test]
    fn corrupt_row_status_is_an_error() {
        let row = TaskRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "t".into(),
            description: String::new(),
            status: "archived".into(),
            due_date: None,
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        };
        assert!(Task::try_from(row).is_err());
    }
}
