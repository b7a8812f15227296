use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    UtcOffset,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, ListQuery, UpdateTaskRequest},
    repo::TaskRepo,
    repo_types::{Task, TaskFilter, TaskStatus},
};
use crate::error::{AppError, AppResult};

pub const TASK_NOT_FOUND: &str = "Task not found";
pub const NOT_TASK_OWNER: &str = "Not authorized to access this task";

/// The single ownership gate every single-task read, update and delete
/// goes through.
pub fn assert_ownership(task: Option<Task>, task_id: Uuid, user_id: Uuid) -> AppResult<Task> {
    match task {
        None => {
            warn!(kind = "not_found", %task_id, %user_id, "task access rejected");
            Err(AppError::NotFound(TASK_NOT_FOUND.into()))
        }
        Some(task) if task.owner_id != user_id => {
            warn!(
                kind = "forbidden",
                %task_id,
                %user_id,
                owner_id = %task.owner_id,
                "task access rejected"
            );
            Err(AppError::Forbidden(NOT_TASK_OWNER.into()))
        }
        Some(task) => Ok(task),
    }
}

pub fn parse_status(raw: &str) -> AppResult<TaskStatus> {
    raw.parse::<TaskStatus>().map_err(AppError::Validation)
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its UTC date.
/// Blank means "no due date".
pub fn parse_due_date(raw: &str) -> AppResult<Option<Date>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(Some(date));
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .map(|ts| Some(ts.to_offset(UtcOffset::UTC).date()))
        .map_err(|_| AppError::Validation(format!("Invalid dueDate '{raw}', expected YYYY-MM-DD")))
}

fn parse_title(raw: &str) -> AppResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Please add a title".into()));
    }
    Ok(title.to_owned())
}

impl TryFrom<ListQuery> for TaskFilter {
    type Error = AppError;

    fn try_from(q: ListQuery) -> AppResult<Self> {
        let status = match q.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(parse_status(s)?),
        };
        let due_on_or_before = match q.due_date.as_deref() {
            None => None,
            Some(d) => parse_due_date(d)?,
        };
        Ok(Self {
            status,
            due_on_or_before,
        })
    }
}

/// Replace-if-provided merge. Everything is validated before anything is
/// written, so a rejected update leaves `task` untouched.
pub fn apply_update(task: &mut Task, fields: UpdateTaskRequest) -> AppResult<()> {
    let title = match fields.title {
        None => None,
        Some(None) => return Err(AppError::Validation("Please add a title".into())),
        Some(Some(t)) => Some(parse_title(&t)?),
    };
    let status = match fields.status {
        None => None,
        Some(None) => return Err(AppError::Validation("status must not be null".into())),
        Some(Some(s)) => Some(parse_status(&s)?),
    };
    let due_date = match fields.due_date {
        None => None,
        Some(None) => Some(None),
        Some(Some(d)) => Some(parse_due_date(&d)?),
    };

    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = fields.description {
        task.description = description.unwrap_or_default();
    }
    if let Some(status) = status {
        task.status = status;
    }
    if let Some(due_date) = due_date {
        task.due_date = due_date;
    }
    Ok(())
}

pub async fn list_tasks(
    repo: &dyn TaskRepo,
    user_id: Uuid,
    filter: &TaskFilter,
) -> AppResult<Vec<Task>> {
    repo.list_by_owner(user_id, filter).await
}

/// The owner always comes from the verified caller, never from the body.
pub async fn create_task(
    repo: &dyn TaskRepo,
    user_id: Uuid,
    fields: CreateTaskRequest,
) -> AppResult<Task> {
    let title = parse_title(fields.title.as_deref().unwrap_or_default())?;
    let status = match fields.status.as_deref() {
        None => TaskStatus::default(),
        Some(s) => parse_status(s)?,
    };
    let due_date = match fields.due_date.as_deref() {
        None => None,
        Some(d) => parse_due_date(d)?,
    };

    let now = OffsetDateTime::now_utc();
    let task = repo
        .insert(&Task {
            id: Uuid::new_v4(),
            owner_id: user_id,
            title,
            description: fields.description.unwrap_or_default(),
            status,
            due_date,
            created_at: now,
            updated_at: now,
        })
        .await?;

    info!(task_id = %task.id, %user_id, "task created");
    Ok(task)
}

pub async fn get_task(repo: &dyn TaskRepo, user_id: Uuid, task_id: Uuid) -> AppResult<Task> {
    let task = repo.find_by_id(task_id).await?;
    assert_ownership(task, task_id, user_id)
}

pub async fn update_task(
    repo: &dyn TaskRepo,
    user_id: Uuid,
    task_id: Uuid,
    fields: UpdateTaskRequest,
) -> AppResult<Task> {
    let mut task = get_task(repo, user_id, task_id).await?;
    apply_update(&mut task, fields)?;
    task.updated_at = OffsetDateTime::now_utc();

    let updated = repo
        .update(&task)
        .await?
        .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))?;

    info!(%task_id, %user_id, "task updated");
    Ok(updated)
}

pub async fn delete_task(repo: &dyn TaskRepo, user_id: Uuid, task_id: Uuid) -> AppResult<()> {
    get_task(repo, user_id, task_id).await?;
    if !repo.delete(task_id, user_id).await? {
        return Err(AppError::NotFound(TASK_NOT_FOUND.into()));
    }
    info!(%task_id, %user_id, "task deleted");
    Ok(())
}
