//! End-to-end tests through the webhook router

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use crate::config::Config;
use crate::handler::Handler;
use crate::http::create_router;
use crate::integration::fixtures::{FakeEncoder, TestEnv};
use crate::state::AppState;

fn notification(bucket: &str, key: &str) -> String {
    serde_json::json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "minio:s3",
            "eventName": "s3:ObjectCreated:Put",
            "s3": {
                "bucket": {"name": bucket},
                "object": {"key": key, "size": 6}
            }
        }]
    })
    .to_string()
}

fn app(env: &TestEnv, encoder: &FakeEncoder) -> (Router, Arc<AppState>) {
    let transcode = env.transcode_config(encoder.path());
    let config = Arc::new(Config {
        transcode: transcode.clone(),
        ..Default::default()
    });
    let handler = Handler::new(Arc::new(transcode), Arc::new(env.store.clone()));
    let state = Arc::new(AppState::new(config, handler));
    (create_router(state.clone()), state)
}

async fn post_event(app: Router, body: String) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/events")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn test_health_and_version() {
    let env = TestEnv::new();
    let encoder = FakeEncoder::silent(&env.bin_dir());
    let (router, _) = app(&env, &encoder);

    let response = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::get("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).starts_with("ogg2mp3 v"));
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let env = TestEnv::new();
    let encoder = FakeEncoder::silent(&env.bin_dir());
    let (router, state) = app(&env, &encoder);

    let (status, body) = post_event(router, r#"{"Records":"nope"}"#.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Malformed trigger event"));
    assert_eq!(state.stats.snapshot().failed, 1);
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let env = TestEnv::new();
    let encoder = FakeEncoder::silent(&env.bin_dir());
    let (router, _) = app(&env, &encoder);

    let (status, body) = post_event(router, notification("audio-in", "folder/track+one.ogg")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("audio-in/folder/track one.ogg"));
    assert!(env.leftover_temp_files().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_event_converts_object() {
    let env = TestEnv::new();
    env.seed("audio-in", "folder/track one.ogg", b"vorbis");
    let encoder = FakeEncoder::copying(&env.bin_dir());
    let (router, state) = app(&env, &encoder);

    let (status, body) = post_event(router, notification("audio-in", "folder/track+one.ogg")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(
        env.object("audio-in", "folder/track one.mp3").unwrap(),
        b"MP3:vorbis"
    );
    assert!(env.leftover_temp_files().is_empty());

    let stats = state.stats.snapshot();
    assert_eq!((stats.started, stats.succeeded, stats.in_flight), (1, 1, 0));
}

#[cfg(unix)]
#[tokio::test]
async fn test_encoder_failure_is_server_error() {
    let env = TestEnv::new();
    env.seed("audio-in", "broken.ogg", b"garbage");
    let encoder = FakeEncoder::failing(&env.bin_dir());
    let (router, _) = app(&env, &encoder);

    let (status, body) = post_event(router, notification("audio-in", "broken.ogg")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Encoder failed"));
    assert!(env.object("audio-in", "broken.mp3").is_none());
    assert!(env.leftover_temp_files().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_debug_stats() {
    let env = TestEnv::new();
    env.seed("audio-in", "a.ogg", b"vorbis");
    let encoder = FakeEncoder::copying(&env.bin_dir());
    let (router, _) = app(&env, &encoder);

    let (status, _) = post_event(router.clone(), notification("audio-in", "a.ogg")).await;
    assert_eq!(status, StatusCode::OK);

    let response = router
        .oneshot(Request::get("/debug/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let stats: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(stats["bitrate"], "128k");
    assert_eq!(stats["invocations"]["succeeded"], 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_abandoned_request_is_not_left_in_flight() {
    let env = TestEnv::new();
    env.seed("audio-in", "long.ogg", b"vorbis");
    let encoder = FakeEncoder::slow(&env.bin_dir());
    let (router, state) = app(&env, &encoder);

    // The client gives up while the encoder is still running
    let request = post_event(router, notification("audio-in", "long.ogg"));
    let outcome = tokio::time::timeout(Duration::from_millis(300), request).await;
    assert!(outcome.is_err());

    let stats = state.stats.snapshot();
    assert_eq!((stats.started, stats.failed, stats.in_flight), (1, 1, 0));
    assert!(env.object("audio-in", "long.mp3").is_none());
    assert!(env.leftover_temp_files().is_empty());
}
