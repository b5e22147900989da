use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
mod tests;

/// Status value reported by the video service.
///
/// Several literal values share one phase; use [`JobStatus::group`] instead of
/// matching on variants when only the phase matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Queued,
    Generating,
    Processing,
    InProgress,
    Working,
    Completed,
    Failed,
    NotFound,
    Timeout,
    ConnectionError,
    ApiError,
    UnknownError,
    Unknown,
    LimitExceeded,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusGroup {
    Queued,
    Active,
    Succeeded,
    Failed,
    Unrecognized,
}

impl StatusGroup {
    pub fn is_terminal(self) -> bool {
        matches!(self, StatusGroup::Succeeded | StatusGroup::Failed)
    }
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => JobStatus::Pending,
            "queued" => JobStatus::Queued,
            "generating" => JobStatus::Generating,
            "processing" => JobStatus::Processing,
            "in_progress" => JobStatus::InProgress,
            "working" => JobStatus::Working,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "not_found" => JobStatus::NotFound,
            "timeout" => JobStatus::Timeout,
            "connection_error" => JobStatus::ConnectionError,
            "api_error" => JobStatus::ApiError,
            "unknown_error" => JobStatus::UnknownError,
            "unknown" => JobStatus::Unknown,
            "limit_exceeded" => JobStatus::LimitExceeded,
            _ => JobStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Queued => "queued",
            JobStatus::Generating => "generating",
            JobStatus::Processing => "processing",
            JobStatus::InProgress => "in_progress",
            JobStatus::Working => "working",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::NotFound => "not_found",
            JobStatus::Timeout => "timeout",
            JobStatus::ConnectionError => "connection_error",
            JobStatus::ApiError => "api_error",
            JobStatus::UnknownError => "unknown_error",
            JobStatus::Unknown => "unknown",
            JobStatus::LimitExceeded => "limit_exceeded",
            JobStatus::Other(raw) => raw,
        }
    }

    pub fn group(&self) -> StatusGroup {
        match self {
            JobStatus::Pending | JobStatus::Queued => StatusGroup::Queued,
            JobStatus::Generating
            | JobStatus::Processing
            | JobStatus::InProgress
            | JobStatus::Working => StatusGroup::Active,
            JobStatus::Completed => StatusGroup::Succeeded,
            JobStatus::Failed
            | JobStatus::NotFound
            | JobStatus::Timeout
            | JobStatus::ConnectionError
            | JobStatus::ApiError
            | JobStatus::UnknownError
            | JobStatus::Unknown
            | JobStatus::LimitExceeded => StatusGroup::Failed,
            JobStatus::Other(_) => StatusGroup::Unrecognized,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.group().is_terminal()
    }

    /// Human-readable label shown to users for this status.
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Completed => "video ready",
            JobStatus::Pending
            | JobStatus::Queued
            | JobStatus::Generating
            | JobStatus::Processing
            | JobStatus::InProgress
            | JobStatus::Working => "generating",
            JobStatus::Failed => "video generation failed",
            JobStatus::NotFound => "video not found",
            JobStatus::Timeout => "generation timed out on the server",
            JobStatus::ConnectionError => "video service connection error",
            JobStatus::ApiError => "video service API error",
            JobStatus::UnknownError => "unknown generation error",
            JobStatus::Unknown | JobStatus::Other(_) => "unknown status",
            JobStatus::LimitExceeded => "video generation limit exceeded",
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        JobStatus::parse(&raw)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
