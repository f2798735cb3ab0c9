//! Typed HTTP client for the task API.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::ClientError;
use crate::api::{DeleteResponse, ErrorBody, HealthResponse};
use crate::models::{CreateTaskInput, Task, TaskQuery, UpdateTaskInput};

#[derive(Debug, Clone)]
pub struct TaskClient {
    client: Client,
    base_url: String,
}

impl TaskClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self.client.get(self.url("/health")).send().await?;
        decode(response).await
    }

    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let response = self
            .client
            .get(self.url("/tasks"))
            .query(&query.to_params())
            .send()
            .await?;
        decode(response).await
    }

    pub async fn get_task(&self, id: i64) -> Result<Task, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/tasks/{}", id)))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ClientError> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .json(input)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_task(&self, id: i64, input: &UpdateTaskInput) -> Result<Task, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/tasks/{}", id)))
            .json(input)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<DeleteResponse, ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{}", id)))
            .send()
            .await?;
        decode(response).await
    }
}

/// Deserialize a success body, or turn an error body into [`ClientError::Api`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
