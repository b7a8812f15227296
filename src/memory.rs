//! In-process stores with the same semantics as the Postgres ones. Used
//! when no `DATABASE_URL` is configured, and by the tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::{UserRepo, EMAIL_TAKEN},
        repo_types::User,
    },
    error::{AppError, AppResult},
    tasks::{
        repo::TaskRepo,
        repo_types::{Task, TaskFilter},
    },
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        users.push(user.clone());
        Ok(user.clone())
    }
}

/// Tasks kept in insertion order, which is creation order.
#[derive(Default)]
pub struct MemoryTaskRepo {
    tasks: RwLock<Vec<Task>>,
}

#[async_trait]
impl TaskRepo for MemoryTaskRepo {
    async fn list_by_owner(&self, owner_id: Uuid, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .rev()
            .filter(|t| t.owner_id == owner_id && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn insert(&self, task: &Task) -> AppResult<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "duplicate task id {}",
                task.id
            )));
        }
        tasks.push(task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> AppResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(stored) = tasks
            .iter_mut()
            .find(|t| t.id == task.id && t.owner_id == task.owner_id)
        else {
            return Ok(None);
        };
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.due_date = task.due_date;
        stored.updated_at = task.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<bool> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.owner_id == owner_id));
        Ok(tasks.len() < before)
    }
}
