// src/diarize/types.rs
// Diarization Types and Error Definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One diarized speech turn.
///
/// `speaker` is the label the provider assigned for this job only (e.g.
/// "SPEAKER_00"); it carries no identity guarantee across jobs. `start` and
/// `end` are absolute offsets in seconds within the submitted audio, with
/// `start <= end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Handle for a diarization job accepted by the provider.
#[derive(Debug, Clone)]
pub struct DiarizationJob {
    pub job_id: String,
    pub status: String,
}

/// Terminal job statuses reported by the provider.
pub fn is_terminal_status(status: &str) -> bool {
    matches!(status, "succeeded" | "failed" | "canceled")
}

/// Diarization error types with retry classification
#[derive(Debug, Error)]
pub enum DiarizeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Authentication failed")]
    Auth,

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Job polling timeout: {0}")]
    PollTimeout(String),

    #[error("Job {job_id} ended as {status}")]
    JobFailed { job_id: String, status: String },

    #[error("Provider error: {0}")]
    Provider(String),
}

impl DiarizeError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiarizeError::Network(_) | DiarizeError::Timeout | DiarizeError::RateLimit
        )
    }
}
