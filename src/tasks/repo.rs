use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Task, TaskFilter, TaskRow};
use crate::error::AppResult;

/// Persistence for tasks. Each call is a single atomic store operation;
/// concurrent writes to the same task are last-write-wins.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    /// Owner's tasks matching `filter`, most recently created first.
    async fn list_by_owner(&self, owner_id: Uuid, filter: &TaskFilter) -> AppResult<Vec<Task>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>>;
    async fn insert(&self, task: &Task) -> AppResult<Task>;
    /// Writes the mutable fields of `task`, guarded by its owner.
    /// `None` if the task no longer exists.
    async fn update(&self, task: &Task) -> AppResult<Option<Task>>;
    /// `false` if nothing was deleted.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<bool>;
}

pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn list_by_owner(&self, owner_id: Uuid, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, owner_id, title, description, status, due_date, created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::date IS NULL OR (due_date IS NOT NULL AND due_date <= $3))
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.due_on_or_before)
        .fetch_all(&self.db)
        .await?;

        let tasks = rows
            .into_iter()
            .map(Task::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, owner_id, title, description, status, due_date, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Task::try_from).transpose()?)
    }

    async fn insert(&self, task: &Task) -> AppResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks
                (id, owner_id, title, description, status, due_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, owner_id, title, description, status, due_date, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(task.owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(Task::try_from(row)?)
    }

    async fn update(&self, task: &Task) -> AppResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
               SET title = $3, description = $4, status = $5, due_date = $6, updated_at = $7
             WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, status, due_date, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(task.owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.updated_at)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Task::try_from).transpose()?)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<bool> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
