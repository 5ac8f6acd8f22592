// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access to the planner API from a client device.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{ProfileUpdate, ProfileView, Task, TaskList};
use crate::sync::SyncError;

/// Request timeout for API calls (the event stream is exempt).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Server-side operations the sync layer depends on.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The caller's profile, or `None` if it has not been created yet.
    async fn fetch_profile(&self) -> Result<Option<ProfileView>, SyncError>;

    async fn init_profile(&self) -> Result<ProfileView, SyncError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileView, SyncError>;

    async fn fetch_tasks(&self) -> Result<TaskList, SyncError>;

    /// Replace the stored task set with `tasks`.
    async fn save_tasks(&self, tasks: &[Task]) -> Result<TaskList, SyncError>;
}

#[derive(Serialize)]
struct SaveTasksRequest<'a> {
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// `RemoteStore` over HTTP, authenticated with a session token.
#[derive(Clone)]
pub struct HttpRemote {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
}

impl HttpRemote {
    pub fn new(base_url: &str, session_token: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, session_token)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str, session_token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = request
            .bearer_auth(&self.session_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        check_response(response).await
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SyncError> {
        let response = self.send(request).await?;
        response.json().await.map_err(|e| SyncError::Remote {
            status: 200,
            message: format!("JSON parse error: {e}"),
        })
    }
}

/// Map non-success responses to `SyncError`, keeping the server's message.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.details.unwrap_or(parsed.error),
        Err(_) => body,
    };

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound(message));
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("API rate limit hit (429)");
    }
    Err(SyncError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch_profile(&self) -> Result<Option<ProfileView>, SyncError> {
        match self.json(self.http.get(self.url("/api/profile"))).await {
            Ok(profile) => Ok(Some(profile)),
            Err(SyncError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn init_profile(&self) -> Result<ProfileView, SyncError> {
        self.json(self.http.post(self.url("/api/profile"))).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileView, SyncError> {
        self.json(self.http.patch(self.url("/api/profile")).json(update))
            .await
    }

    async fn fetch_tasks(&self) -> Result<TaskList, SyncError> {
        self.json(self.http.get(self.url("/api/tasks"))).await
    }

    async fn save_tasks(&self, tasks: &[Task]) -> Result<TaskList, SyncError> {
        self.json(
            self.http
                .put(self.url("/api/tasks"))
                .json(&SaveTasksRequest { tasks }),
        )
        .await
    }
}
