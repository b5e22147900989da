pub mod video;

use crate::job::Job;
use async_trait::async_trait;
use thiserror::Error;

pub use video::{LessonVideoInfo, VideoApiClient};

/// Failure of a single status query. Always transient from the poller's view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("network error: {0}")]
    Network(String),
    #[error("status endpoint returned HTTP {0}")]
    Http(u16),
    #[error("malformed status response: {0}")]
    Parse(String),
    #[error("status query rejected: {0}")]
    Rejected(String),
}

/// Where the poller reads job status from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<Job, QueryError>;
}
