use super::{QueryError, StatusSource};
use crate::cache::SlotKey;
use crate::config;
use crate::job::{Job, JobStatus};
use crate::logging::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::result::Result;
use std::time::Duration;

#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Video information stored server-side for a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LessonVideoInfo {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub video_status: Option<String>,
    #[serde(default)]
    pub video_download_url: Option<String>,
}

pub struct VideoApiClient {
    client: Client,
    base_url: String,
}

impl VideoApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config() -> anyhow::Result<Self> {
        Self::new(
            config::get("API_BASE_URL")?,
            config::get_duration("REQUEST_TIMEOUT")?,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_envelope<T: DeserializeOwned>(&self, url: &str) -> Result<Envelope<T>, QueryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QueryError::Http(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| QueryError::Parse(e.to_string()))
    }

    /// Looks up the job recorded server-side for a lesson, if any.
    pub async fn lesson_video_info(
        &self,
        slot: &SlotKey,
    ) -> Result<Option<LessonVideoInfo>, QueryError> {
        let log = DEFAULT.new(o!(
            "function" => "VideoApiClient::lesson_video_info",
            "slot" => slot.to_string(),
        ));
        let url = format!(
            "{}/api/video/lesson/{}/{}/{}/info",
            self.base_url, slot.course_id, slot.module_number, slot.lesson_index
        );
        debug!(log, "requesting"; "url" => &url);

        let envelope: Envelope<LessonVideoInfo> = self.get_envelope(&url).await?;
        if !envelope.success {
            return Err(rejected(&envelope));
        }
        Ok(envelope.data.filter(|info| info.video_id.is_some()))
    }
}

fn rejected<T>(envelope: &Envelope<T>) -> QueryError {
    QueryError::Rejected(
        envelope
            .message
            .clone()
            .or_else(|| envelope.detail.clone())
            .unwrap_or_else(|| "success=false".to_string()),
    )
}

#[async_trait]
impl StatusSource for VideoApiClient {
    async fn fetch_status(&self, job_id: &str) -> Result<Job, QueryError> {
        let log = DEFAULT.new(o!(
            "function" => "VideoApiClient::fetch_status",
            "job_id" => job_id.to_owned(),
        ));
        let url = format!("{}/api/video/status/{}", self.base_url, job_id);

        let envelope: Envelope<StatusPayload> = match self.get_envelope(&url).await {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(log, "query failed"; "error" => %err);
                return Err(err);
            }
        };
        if !envelope.success {
            return Err(rejected(&envelope));
        }
        let payload = envelope
            .data
            .ok_or_else(|| QueryError::Parse("response has no data".to_string()))?;

        let reported_progress = payload
            .progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0) as u8);

        trace!(log, "status"; "status" => &payload.status, "progress" => ?reported_progress);
        Ok(Job {
            job_id: job_id.to_string(),
            status: JobStatus::parse(&payload.status),
            reported_progress,
            result_url: payload.download_url.filter(|url| !url.is_empty()),
            error_message: payload.error,
        })
    }
}
