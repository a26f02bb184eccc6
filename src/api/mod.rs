use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::models::*;

// ─── Error types ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Rate limited – retry after {retry_after:.1}s")]
    RateLimited { retry_after: f64 },
    #[error("Unauthorized – check your API token")]
    Unauthorized,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// Forbidden and not-found mean the student isn't visible to us.
    fn is_no_access(&self) -> bool {
        matches!(self, Self::Api { status: 403 | 404, .. })
    }
}

// ─── Data source ────────────────────────────────────────────────────────────

/// The remote reads the dashboard depends on.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// `Ok(None)` when the student has no access to the course or doesn't exist.
    async fn student_summary(
        &self,
        course_id: u64,
        github_id: &str,
    ) -> Result<Option<StudentSummary>, ApiError>;

    async fn course_tasks(&self, course_id: u64) -> Result<Vec<CourseTask>, ApiError>;

    async fn course_events(&self, course_id: u64) -> Result<Vec<CourseEvent>, ApiError>;

    async fn profile_stats(&self, github_id: &str) -> Result<Vec<ProfileCourseStats>, ApiError>;

    async fn invite_to_repository(&self, course_id: u64, github_id: &str) -> Result<(), ApiError>;
}

// ─── Client ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl DashboardClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API URL: {base_url}"))?;

        let client = Client::builder()
            .user_agent("student-dashboard/0.1.0")
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        let full = format!("/api{}", path);
        self.base_url
            .join(&full)
            .with_context(|| format!("Bad API path: {path}"))
    }

    async fn get(&self, path: &str) -> Result<Response, ApiError> {
        let url = self.api_url(path).map_err(ApiError::Other)?;
        tracing::debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check_status(resp).await
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.get(path).await?;
        let body: ApiResponse<T> = resp.json().await?;
        Ok(body.data)
    }

    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.api_url(path).map_err(ApiError::Other)?;
        tracing::debug!(%url, "POST");
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::check_status(resp).await
    }

    async fn check_status(resp: Response) -> Result<Response, ApiError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ApiError::Api {
                status: 403,
                message: "Forbidden – insufficient permissions".into(),
            }),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(1.0);
                Err(ApiError::RateLimited { retry_after: retry })
            }
            s if s.is_client_error() || s.is_server_error() => {
                let status = s.as_u16();
                let message = resp.text().await.unwrap_or_default();
                Err(ApiError::Api { status, message })
            }
            _ => Ok(resp),
        }
    }
}

#[async_trait]
impl DashboardSource for DashboardClient {
    async fn student_summary(
        &self,
        course_id: u64,
        github_id: &str,
    ) -> Result<Option<StudentSummary>, ApiError> {
        match self
            .get_data(&format!("/course/{course_id}/student/{github_id}/summary"))
            .await
        {
            Ok(summary) => Ok(summary),
            Err(e) if e.is_no_access() => {
                tracing::info!(course_id, github_id, "no access to student summary: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn course_tasks(&self, course_id: u64) -> Result<Vec<CourseTask>, ApiError> {
        self.get_data(&format!("/course/{course_id}/tasks")).await
    }

    async fn course_events(&self, course_id: u64) -> Result<Vec<CourseEvent>, ApiError> {
        self.get_data(&format!("/course/{course_id}/events")).await
    }

    async fn profile_stats(&self, github_id: &str) -> Result<Vec<ProfileCourseStats>, ApiError> {
        self.get_data(&format!("/profile/{github_id}/stats")).await
    }

    async fn invite_to_repository(&self, course_id: u64, github_id: &str) -> Result<(), ApiError> {
        self.post_json(
            &format!("/course/{course_id}/student/{github_id}/repository"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }
}
