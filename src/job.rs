pub mod status;

pub use status::{JobStatus, StatusGroup};

/// Last observed state of one remote generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    /// 0-100 when the service reports it; often absent or stuck at 0.
    pub reported_progress: Option<u8>,
    /// Set once the job has completed.
    pub result_url: Option<String>,
    /// Set on failure statuses.
    pub error_message: Option<String>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            reported_progress: None,
            result_url: None,
            error_message: None,
        }
    }

    /// Message for a failure status, including the service's own error text when given.
    pub fn failure_message(&self) -> String {
        match self.error_message.as_deref().map(str::trim) {
            Some(detail) if !detail.is_empty() => format!("{}: {}", self.status.label(), detail),
            _ => self.status.label().to_string(),
        }
    }
}
