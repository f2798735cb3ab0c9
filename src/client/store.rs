//! Task store combining the HTTP client with the optimistic cache.

use chrono::Utc;

use super::cache::{MutationId, MutationState, TaskCache, Tentative};
use super::{ClientError, TaskClient};
use crate::api::DeleteResponse;
use crate::models::{CreateTaskInput, Task, TaskQuery, UpdateTaskInput};

/// Reads go through the cache; writes are applied to the cache entry for the
/// query being viewed before the server answers, then reconciled with the
/// server's response or rolled back on failure.
#[derive(Debug)]
pub struct TaskStore {
    client: TaskClient,
    cache: TaskCache,
    last_mutation: Option<MutationId>,
}

impl TaskStore {
    pub fn new(client: TaskClient) -> Self {
        Self {
            client,
            cache: TaskCache::new(),
            last_mutation: None,
        }
    }

    pub fn client(&self) -> &TaskClient {
        &self.client
    }

    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// State of the most recent optimistic mutation.
    pub fn last_mutation_state(&self) -> Option<MutationState> {
        self.last_mutation.and_then(|id| self.cache.state(id))
    }

    /// Tasks for `query`, from the cache when it holds a fresh entry.
    pub async fn list(&mut self, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        if self.cache.is_fresh(query) {
            if let Some(tasks) = self.cache.get(query) {
                return Ok(tasks.to_vec());
            }
        }
        self.refresh(query).await
    }

    /// Refetch `query` from the server regardless of the cache.
    pub async fn refresh(&mut self, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let tasks = self.client.list_tasks(query).await?;
        self.cache.store(query.clone(), tasks.clone());
        Ok(tasks)
    }

    pub async fn create(
        &mut self,
        query: &TaskQuery,
        input: CreateTaskInput,
    ) -> Result<Task, ClientError> {
        let now = Utc::now();
        let tentative = Task {
            id: self.cache.temporary_id(),
            title: input.title.as_deref().unwrap_or_default().trim().to_string(),
            description: input.description.clone().filter(|d| !d.is_empty()),
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let mutation = self.begin(query, Tentative::Insert(tentative))?;
        let result = self.client.create_task(&input).await;
        self.settle(mutation, result, |task| Some(task.clone()))
    }

    pub async fn update(
        &mut self,
        query: &TaskQuery,
        id: i64,
        input: UpdateTaskInput,
    ) -> Result<Task, ClientError> {
        let cached = self
            .cache
            .get(query)
            .and_then(|tasks| tasks.iter().find(|t| t.id == id))
            .cloned();

        let Some(mut tentative) = cached else {
            // Nothing on screen to patch; just write through.
            let task = self.client.update_task(id, &input).await?;
            self.cache.invalidate_all();
            return Ok(task);
        };

        input.apply_to(&mut tentative);
        tentative.updated_at = Utc::now();

        let mutation = self.begin(query, Tentative::Replace(tentative))?;
        let result = self.client.update_task(id, &input).await;
        self.settle(mutation, result, |task| Some(task.clone()))
    }

    pub async fn delete(
        &mut self,
        query: &TaskQuery,
        id: i64,
    ) -> Result<DeleteResponse, ClientError> {
        let mutation = self.begin(query, Tentative::Remove(id))?;
        let result = self.client.delete_task(id).await;
        self.settle(mutation, result, |_| None)
    }

    fn begin(&mut self, query: &TaskQuery, change: Tentative) -> Result<MutationId, ClientError> {
        self.cache.prune_settled();
        let mutation = self.cache.stage(query.clone(), change);
        self.cache.apply(mutation)?;
        self.last_mutation = Some(mutation);
        Ok(mutation)
    }

    /// Reconcile with the server's task when `result` succeeded, roll back
    /// otherwise.
    fn settle<T>(
        &mut self,
        mutation: MutationId,
        result: Result<T, ClientError>,
        server_task: impl FnOnce(&T) -> Option<Task>,
    ) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                self.cache.reconcile(mutation, server_task(&value))?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("Rolling back optimistic change: {}", err);
                self.cache.rollback(mutation)?;
                Err(err)
            }
        }
    }
}
