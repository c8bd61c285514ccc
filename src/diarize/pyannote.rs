// src/diarize/pyannote.rs
// pyannote.ai Diarization Adapter

use super::{is_terminal_status, DiarizationJob, DiarizationProvider, DiarizeError, DiarizeOptions, Segment};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const PYANNOTE_API_URL: &str = "https://api.pyannote.ai";
const TIMEOUT_SECS: u64 = 30;
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLL_ATTEMPTS: u32 = 120;

#[derive(Debug, Deserialize)]
struct MediaInputResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct JobCreatedResponse {
    #[serde(rename = "jobId")]
    job_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
    #[serde(default)]
    output: Option<JobOutput>,
}

#[derive(Debug, Deserialize)]
struct JobOutput {
    diarization: Vec<Segment>,
}

pub struct PyannoteAdapter {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl PyannoteAdapter {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, PYANNOTE_API_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        tracing::info!("Pyannote adapter initialized");

        Self {
            api_key,
            base_url,
            client,
        }
    }

    /// Register a media object and upload the audio to its presigned URL.
    /// Returns the object key the job is started against.
    async fn upload(&self, audio: Vec<u8>) -> Result<String, DiarizeError> {
        let object_key = format!("audio-{}", Utc::now().timestamp_millis());

        let response = self
            .client
            .post(format!("{}/v1/media/input", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "url": format!("media://{}", object_key) }))
            .send()
            .await
            .map_err(classify_transport)?;
        let response = check_status(response).await?;

        let presigned: MediaInputResponse = response
            .json()
            .await
            .map_err(|e| DiarizeError::Provider(e.to_string()))?;

        let response = self
            .client
            .put(presigned.url)
            .body(audio)
            .send()
            .await
            .map_err(classify_transport)?;
        check_status(response).await?;

        Ok(object_key)
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatusResponse, DiarizeError> {
        let response = self
            .client
            .get(format!("{}/v1/jobs/{}", self.base_url, job_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(classify_transport)?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| DiarizeError::Provider(e.to_string()))
    }
}

#[async_trait]
impl DiarizationProvider for PyannoteAdapter {
    async fn submit(
        &self,
        audio: Vec<u8>,
        options: &DiarizeOptions,
    ) -> Result<DiarizationJob, DiarizeError> {
        tracing::info!("Pyannote: uploading {} bytes of audio", audio.len());

        let object_key = self.upload(audio).await?;

        let mut payload = json!({ "url": format!("media://{}", object_key) });
        if let Some(webhook) = &options.webhook_url {
            payload["webhook"] = json!(webhook);
        }
        if let Some(num_speakers) = options.num_speakers {
            payload["numSpeakers"] = json!(num_speakers);
        }

        let response = self
            .client
            .post(format!("{}/v1/diarize", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport)?;
        let response = check_status(response).await?;

        let job: JobCreatedResponse = response
            .json()
            .await
            .map_err(|e| DiarizeError::Provider(e.to_string()))?;

        tracing::info!("Pyannote job {} started: {}", job.job_id, job.status);

        Ok(DiarizationJob {
            job_id: job.job_id,
            status: job.status,
        })
    }

    async fn await_result(&self, job_id: &str) -> Result<Vec<Segment>, DiarizeError> {
        for _ in 0..MAX_POLL_ATTEMPTS {
            let data = self.poll(job_id).await?;

            if is_terminal_status(&data.status) {
                if data.status == "succeeded" {
                    return match data.output {
                        Some(output) => Ok(output.diarization),
                        None => Err(DiarizeError::Provider(
                            "succeeded job carried no output".to_string(),
                        )),
                    };
                }
                return Err(DiarizeError::JobFailed {
                    job_id: job_id.to_string(),
                    status: data.status,
                });
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Err(DiarizeError::PollTimeout(job_id.to_string()))
    }

    fn name(&self) -> &str {
        "pyannote.ai"
    }
}

fn classify_transport(e: reqwest::Error) -> DiarizeError {
    if e.is_timeout() {
        DiarizeError::Timeout
    } else {
        DiarizeError::Network(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DiarizeError> {
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else if status.as_u16() == 401 {
        Err(DiarizeError::Auth)
    } else if status.as_u16() == 429 {
        Err(DiarizeError::RateLimit)
    } else {
        let error_text = response.text().await.unwrap_or_default();
        Err(DiarizeError::Provider(format!(
            "HTTP {}: {}",
            status, error_text
        )))
    }
}
