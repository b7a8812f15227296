use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Task, TaskStatus};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Task as it goes over the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(with = "iso_date::option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            owner_id: t.owner_id,
            title: t.title,
            description: t.description,
            status: t.status,
            due_date: t.due_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// POST /tasks body. `status` and `dueDate` stay raw so bad values surface
/// as validation errors with a useful message. Unknown fields such as
/// `ownerId` are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

/// PUT /tasks/:id body. Outer `None` means the field was absent and the
/// stored value is kept; `Some(None)` is an explicit `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<String>>,
}

fn present<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// GET /tasks query. Empty values mean "no filter".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(alias = "dueDateOnOrBefore")]
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn update_request_tells_absent_from_null() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": null, "status": "completed"}"#).unwrap();
        assert_eq!(req.title, None);
        assert_eq!(req.description, Some(None));
        assert_eq!(req.status, Some(Some("completed".to_string())));
        assert_eq!(req.due_date, None);
    }

    #[test]
    fn create_request_ignores_owner_fields() {
        let req: CreateTaskRequest = serde_json::from_str(
            r#"{"title": "T1", "ownerId": "00000000-0000-0000-0000-000000000000", "user": "x"}"#,
        )
        .unwrap();
        assert_eq!(req.title.as_deref(), Some("T1"));
    }

    #[test]
    fn task_response_wire_shape() {
        let task = Task {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "T1".into(),
            description: String::new(),
            status: TaskStatus::Pending,
            due_date: Some(date!(2024-01-10)),
            created_at: datetime!(2024-01-01 12:00 UTC),
            updated_at: datetime!(2024-01-02 12:00 UTC),
        };
        let json = serde_json::to_value(TaskResponse::from(task.clone())).unwrap();
        assert_eq!(json["ownerId"], task.owner_id.to_string());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["dueDate"], "2024-01-10");
        assert_eq!(json["createdAt"], "2024-01-01T12:00:00Z");

        let undated = Task { due_date: None, ..task };
        let json = serde_json::to_value(TaskResponse::from(undated)).unwrap();
        assert!(json.get("dueDate").is_none());
    }
}
