use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use talktally::audio::ChunkBuffer;
use talktally::diarize::{
    DiarizationJob, DiarizationProvider, DiarizeError, DiarizeOptions, Segment,
};
use talktally::resolve::{ProximityMatcher, ResolutionSession};
use talktally::server::{router, AppState};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Provider stub that completes every job with a canned result.
struct StubProvider {
    segments: Vec<Segment>,
}

#[async_trait]
impl DiarizationProvider for StubProvider {
    async fn submit(
        &self,
        _audio: Vec<u8>,
        _options: &DiarizeOptions,
    ) -> Result<DiarizationJob, DiarizeError> {
        Ok(DiarizationJob {
            job_id: "job-test".to_string(),
            status: "created".to_string(),
        })
    }

    async fn await_result(&self, _job_id: &str) -> Result<Vec<Segment>, DiarizeError> {
        Ok(self.segments.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn seg(speaker: &str, start: f64, end: f64) -> Segment {
    Segment {
        speaker: speaker.to_string(),
        start,
        end,
    }
}

fn app(segments: Vec<Segment>) -> axum::Router {
    let state = AppState {
        session: Arc::new(Mutex::new(ResolutionSession::new(Box::new(
            ProximityMatcher,
        )))),
        buffer: Arc::new(Mutex::new(ChunkBuffer::new())),
        provider: Arc::new(StubProvider { segments }),
        webhook_url: None,
    };
    router(state)
}

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn post_raw(app: &axum::Router, uri: &str, body: &'static [u8]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn add_speaker_validates_input() {
    let app = app(Vec::new());

    let (status, body) = post_json(&app, "/api/speakers/add", json!({ "timecode": 1.0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required");

    let (status, body) = post_json(&app, "/api/speakers/add", json!({ "name": "Alice" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Timecode is required");

    let (status, body) = post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Alice", "timecode": 2.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "MANUAL_00");
}

#[tokio::test]
async fn diarize_reports_empty_states_as_non_errors() {
    let app = app(Vec::new());

    let (status, body) = post_json(&app, "/api/diarize", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No speakers added yet. Click + to add speakers.");

    post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Alice", "timecode": 2.0 }),
    )
    .await;

    let (status, body) = post_json(&app, "/api/diarize", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No audio to process");
}

#[tokio::test]
async fn diarize_delivers_polled_result_to_the_session() {
    let app = app(vec![
        seg("SPEAKER_00", 0.0, 5.0),
        seg("SPEAKER_01", 5.0, 12.0),
    ]);

    post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Alice", "timecode": 2.0 }),
    )
    .await;
    post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Bob", "timecode": 10.0 }),
    )
    .await;
    post_raw(&app, "/api/audio/add", b"pcm-chunk").await;

    let (status, body) = post_json(&app, "/api/diarize", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["jobId"], "job-test");

    // The poll task runs in the background; wait for it to land.
    let mut report = Value::Null;
    for _ in 0..100 {
        let (_, body) = get(&app, "/api/speakers").await;
        if body["totalSeconds"].as_f64() == Some(12.0) {
            report = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let speakers = report["speakers"].as_array().expect("result never delivered");
    let alice = speakers.iter().find(|s| s["name"] == "Alice").unwrap();
    let bob = speakers.iter().find(|s| s["name"] == "Bob").unwrap();
    assert_eq!(alice["seconds"], 5.0);
    assert_eq!(bob["seconds"], 7.0);
    assert_eq!(report["timeline"][0]["speaker"], "Alice");
}

#[tokio::test]
async fn webhook_delivers_result_to_the_session() {
    let app = app(Vec::new());

    post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Alice", "timecode": 2.0 }),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/webhook/diarization",
        json!({
            "status": "succeeded",
            "output": {
                "diarization": [ { "speaker": "SPEAKER_00", "start": 0.0, "end": 5.0 } ],
            },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let (_, report) = get(&app, "/api/speakers").await;
    assert_eq!(report["totalSeconds"], 5.0);
    assert_eq!(report["speakers"][0]["name"], "Alice");
}

#[tokio::test]
async fn webhook_ignores_unsuccessful_jobs() {
    let app = app(Vec::new());

    let (status, body) = post_json(
        &app,
        "/api/webhook/diarization",
        json!({ "status": "failed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let (_, report) = get(&app, "/api/speakers").await;
    assert_eq!(report["totalSeconds"], 0.0);
}

#[tokio::test]
async fn rename_changes_display_name() {
    let app = app(Vec::new());

    post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Alice", "timecode": 2.0 }),
    )
    .await;
    post_json(
        &app,
        "/api/webhook/diarization",
        json!({
            "status": "succeeded",
            "output": {
                "diarization": [ { "speaker": "SPEAKER_00", "start": 0.0, "end": 5.0 } ],
            },
        }),
    )
    .await;

    let (status, _) = post_json(
        &app,
        "/api/speakers/Alice/name",
        json!({ "name": "Alice Smith" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, report) = get(&app, "/api/speakers").await;
    assert_eq!(report["speakers"][0]["name"], "Alice Smith");
    assert_eq!(report["speakers"][0]["id"], "Alice");
}

#[tokio::test]
async fn reset_clears_session_and_buffer() {
    let app = app(Vec::new());

    post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Alice", "timecode": 2.0 }),
    )
    .await;
    post_raw(&app, "/api/audio/add", b"pcm-chunk").await;
    post_json(
        &app,
        "/api/webhook/diarization",
        json!({
            "status": "succeeded",
            "output": {
                "diarization": [ { "speaker": "SPEAKER_00", "start": 0.0, "end": 5.0 } ],
            },
        }),
    )
    .await;

    let (status, body) = post_json(&app, "/api/reset", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, report) = get(&app, "/api/speakers").await;
    assert_eq!(report["speakers"].as_array().unwrap().len(), 0);
    assert_eq!(report["totalSeconds"], 0.0);

    // The audio buffer was cleared with the session.
    post_json(
        &app,
        "/api/speakers/add",
        json!({ "name": "Bob", "timecode": 1.0 }),
    )
    .await;
    let (_, body) = post_json(&app, "/api/diarize", json!({})).await;
    assert_eq!(body["message"], "No audio to process");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(Vec::new());

    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}
