//! Integration test: form server endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use windspeed::config::ArtifactPaths;
use windspeed::features::RawObservation;
use windspeed::persist::{save_model, write_metrics, ArtifactHeader, ARTIFACT_MAGIC};
use windspeed::server::{create_router, AppState, ServerConfig};
use windspeed::training::{train, TrainingConfig};

fn synthetic_days(n: usize) -> Vec<RawObservation> {
    let start = NaiveDate::from_ymd_opt(2023, 7, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let t = i as f64;
            RawObservation::new(start + Duration::days(i as i64), 4.0 + (t / 3.0).sin(), 3.0 + (t / 5.0).cos())
        })
        .collect()
}

fn config_for(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        artifacts: ArtifactPaths::in_dir(dir.path()),
    }
}

/// App with a freshly trained model on disk
fn trained_app() -> (axum::Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let outcome = train(&synthetic_days(40), &TrainingConfig::default().with_n_estimators(20)).unwrap();
    save_model(&outcome.model, &config.artifacts.model).unwrap();
    write_metrics(&outcome.metrics, &config.artifacts.metrics).unwrap();

    let state = Arc::new(AppState::new(config));
    (create_router(state), dir)
}

/// App started before any training run
fn empty_app() -> (axum::Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let state = Arc::new(AppState::new(config_for(&dir)));
    (create_router(state), dir)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = trained_app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_loaded"], true);
}

#[tokio::test]
async fn test_root_serves_form() {
    let (app, _dir) = empty_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 256).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Wind Speed Prediction"));
    assert!(html.contains("/api/predict"));
}

#[tokio::test]
async fn test_form_prediction() {
    let (app, _dir) = trained_app();
    let response = app
        .oneshot(post_json(
            "/api/predict",
            serde_json::json!({
                "uwnd": 4.0, "vwnd": 3.5,
                "lag_1": 8.5, "lag_2": 7.2, "lag_3": 6.0,
                "altitude": 12
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let ms = json["predicted_ms"].as_f64().unwrap();
    let kms = json["predicted_kms"].as_f64().unwrap();
    assert!((kms * 1000.0 - ms).abs() < 1e-9);
    assert_eq!(json["altitude_km"].as_u64(), Some(12));

    let trend = json["trend"].as_array().unwrap();
    assert_eq!(trend.len(), 4);
    assert_eq!(trend[0]["value"].as_f64(), Some(6.0));
    assert_eq!(trend[3]["value"].as_f64(), Some(ms));
}

#[tokio::test]
async fn test_form_rejects_negative_lag() {
    let (app, _dir) = trained_app();
    let response = app
        .oneshot(post_json(
            "/api/predict",
            serde_json::json!({
                "uwnd": 4.0, "vwnd": 3.5,
                "lag_1": -1.0, "lag_2": 7.2, "lag_3": 6.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_prediction_without_model() {
    let (app, _dir) = empty_app();
    let response = app
        .oneshot(post_json(
            "/api/predict/vector",
            serde_json::json!({ "features": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0, 4.0] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert!(json["message"].as_str().unwrap().contains("Train it first"));
}

#[tokio::test]
async fn test_prediction_with_mismatched_model() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let outcome = train(&synthetic_days(40), &TrainingConfig::default().with_n_estimators(5)).unwrap();

    let mut header = ArtifactHeader::current();
    header.feature_names.swap(0, 1);
    let mut bytes = ARTIFACT_MAGIC.to_vec();
    bytes.extend(bincode::serialize(&header).unwrap());
    bytes.extend(bincode::serialize(&outcome.model).unwrap());
    std::fs::create_dir_all(config.artifacts.model.parent().unwrap()).unwrap();
    std::fs::write(&config.artifacts.model, bytes).unwrap();

    let app = create_router(Arc::new(AppState::new(config)));
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/predict/vector",
            serde_json::json!({ "features": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 100.0, 4.0] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let message = json_body(response).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("feature order"), "{}", message);
    assert!(!message.contains("Train it first"));

    let health = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = json_body(health).await;
    assert_eq!(json["model_loaded"], false);
    assert!(json["model_error"].as_str().unwrap().contains("mismatch"));
}

#[tokio::test]
async fn test_vector_shape_error() {
    let (app, _dir) = trained_app();
    let response = app
        .oneshot(post_json(
            "/api/predict/vector",
            serde_json::json!({ "features": [1.0, 2.0, 3.0] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_prediction() {
    let (app, _dir) = trained_app();
    let records: Vec<serde_json::Value> = synthetic_days(6)
        .iter()
        .map(|r| {
            serde_json::json!({
                "time": r.time.format("%Y-%m-%d").to_string(),
                "uwnd": r.uwnd,
                "vwnd": r.vwnd,
            })
        })
        .collect();

    let response = app
        .oneshot(post_json("/api/predict/batch", serde_json::json!({ "records": records })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["predictions"].as_array().unwrap().len(), 3);
    assert_eq!(json["skipped"], 3);
}

#[tokio::test]
async fn test_batch_missing_component() {
    let (app, _dir) = trained_app();
    let response = app
        .oneshot(post_json(
            "/api/predict/batch",
            serde_json::json!({ "records": [{ "time": "2020-01-01", "uwnd": 1.0, "vwnd": null }] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _dir) = trained_app();
    let response = app
        .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["available"], true);
    assert!(json["text"].as_str().unwrap().starts_with("Mean Squared Error (MSE):"));
    assert!(json["metrics"]["r2"].as_f64().unwrap() <= 1.0);
}

#[tokio::test]
async fn test_metrics_unavailable() {
    let (app, _dir) = empty_app();
    let response = app
        .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["available"], false);
    assert_eq!(json["text"], "Metrics not available");
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _dir) = empty_app();
    let response = app
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
