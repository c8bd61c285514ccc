// src/diarize/mod.rs
// Diarization Module - External Provider Adapters

mod pyannote;
mod types;

pub use pyannote::PyannoteAdapter;
pub use types::{is_terminal_status, DiarizationJob, DiarizeError, Segment};

use async_trait::async_trait;

/// Options for one diarization job.
#[derive(Debug, Clone, Default)]
pub struct DiarizeOptions {
    /// Hint for the expected number of speakers.
    pub num_speakers: Option<usize>,
    /// Callback URL the provider pushes the finished result to. When set,
    /// the caller must not also poll the job; each job has exactly one
    /// delivery path.
    pub webhook_url: Option<String>,
}

/// Black-box diarization service: accepts a batch of audio, returns labeled
/// segments once the job completes.
#[async_trait]
pub trait DiarizationProvider: Send + Sync {
    /// Upload the audio and start a diarization job.
    async fn submit(
        &self,
        audio: Vec<u8>,
        options: &DiarizeOptions,
    ) -> Result<DiarizationJob, DiarizeError>;

    /// Poll the job until it reaches a terminal status and return its
    /// segments. Only used when no webhook was configured for the job.
    async fn await_result(&self, job_id: &str) -> Result<Vec<Segment>, DiarizeError>;

    /// Get provider name
    fn name(&self) -> &str;
}
