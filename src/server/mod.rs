// HTTP surface. Thin wrappers over the session, the audio buffer, and the
// diarization provider; no resolution logic lives here.

use crate::audio::ChunkBuffer;
use crate::diarize::{DiarizationProvider, DiarizeOptions, Segment};
use crate::resolve::{ResolutionSession, SpeakerReport};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<ResolutionSession>>,
    pub buffer: Arc<Mutex<ChunkBuffer>>,
    pub provider: Arc<dyn DiarizationProvider>,
    /// When set, jobs are started with this callback URL and never polled.
    pub webhook_url: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/audio/add", post(add_audio))
        .route("/api/diarize", post(diarize))
        .route("/api/webhook/diarization", post(webhook_diarization))
        .route("/api/speakers", get(get_speakers))
        .route("/api/speakers/add", post(add_speaker))
        .route("/api/speakers/:id/name", post(update_speaker_name))
        .route("/api/reset", post(reset))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Add an audio chunk to the buffer.
async fn add_audio(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let mut buffer = state.buffer.lock().await;
    buffer.append(body);

    Json(json!({
        "success": true,
        "bufferSize": buffer.chunk_count(),
    }))
}

/// Drain the buffered audio and start a diarization job. The finished
/// result is delivered in the background, through exactly one path: the
/// configured webhook, or a spawned poll loop.
async fn diarize(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let hint = {
        let session = state.session.lock().await;
        session.speaker_hint()
    };

    // Empty states are "nothing to do", not failures.
    if hint == Some(0) {
        return (
            StatusCode::OK,
            Json(json!({
                "success": false,
                "message": "No speakers added yet. Click + to add speakers.",
            })),
        );
    }

    let audio = {
        let mut buffer = state.buffer.lock().await;
        if buffer.is_empty() {
            return (
                StatusCode::OK,
                Json(json!({
                    "success": false,
                    "message": "No audio to process",
                })),
            );
        }
        buffer.drain()
    };

    tracing::info!("Starting diarization with numSpeakers={:?}", hint);

    let options = DiarizeOptions {
        num_speakers: hint,
        webhook_url: state.webhook_url.clone(),
    };

    match state.provider.submit(audio, &options).await {
        Ok(job) => {
            if state.webhook_url.is_none() {
                // Poll-until-terminal delivery path.
                let provider = state.provider.clone();
                let session = state.session.clone();
                let job_id = job.job_id.clone();
                tokio::spawn(async move {
                    match provider.await_result(&job_id).await {
                        Ok(segments) => {
                            let mut session = session.lock().await;
                            session.record_result(segments);
                        }
                        Err(e) => {
                            tracing::error!("Polling error: {}", e);
                        }
                    }
                });
            }

            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "jobId": job.job_id,
                    "status": job.status,
                })),
            )
        }
        Err(e) => {
            tracing::error!("Error starting diarization: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    status: Option<String>,
    output: Option<WebhookOutput>,
}

#[derive(Debug, Deserialize)]
struct WebhookOutput {
    diarization: Option<Vec<Segment>>,
}

/// Pushed-callback delivery path. Funnels into the same session entry
/// point as the poll loop.
async fn webhook_diarization(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Json<Value> {
    if payload.status.as_deref() == Some("succeeded") {
        if let Some(segments) = payload.output.and_then(|output| output.diarization) {
            let mut session = state.session.lock().await;
            session.record_result(segments);
        }
    }

    Json(json!({ "received": true }))
}

/// Get current speaker times and timeline segments.
async fn get_speakers(State(state): State<AppState>) -> Json<SpeakerReport> {
    let session = state.session.lock().await;
    Json(session.speakers())
}

#[derive(Debug, Deserialize)]
struct AddSpeakerPayload {
    name: Option<String>,
    timecode: Option<f64>,
}

/// Register a named speaker anchor with its timecode.
async fn add_speaker(
    State(state): State<AppState>,
    Json(payload): Json<AddSpeakerPayload>,
) -> (StatusCode, Json<Value>) {
    let Some(name) = payload.name else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Name is required" })),
        );
    };
    let Some(timecode) = payload.timecode else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Timecode is required" })),
        );
    };

    let mut session = state.session.lock().await;
    match session.add_anchor(&name, timecode) {
        Ok(anchor) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "id": anchor.id,
                "name": anchor.name,
                "timecode": anchor.timecode,
            })),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

#[derive(Debug, Deserialize)]
struct RenamePayload {
    name: String,
}

/// Update a speaker's custom display name.
async fn update_speaker_name(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RenamePayload>,
) -> Json<Value> {
    let mut session = state.session.lock().await;
    session.rename(&id, &payload.name);

    Json(json!({
        "success": true,
        "id": id,
        "name": payload.name,
    }))
}

/// Reset the session and the audio buffer together.
async fn reset(State(state): State<AppState>) -> Json<Value> {
    let mut session = state.session.lock().await;
    let mut buffer = state.buffer.lock().await;
    session.reset();
    buffer.clear();

    Json(json!({ "success": true }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
