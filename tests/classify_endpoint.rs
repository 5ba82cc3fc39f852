use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::{Array2, Array4, Axis};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use markai_backend::app::build_classify_app;
use markai_backend::config::CorsConfig;
use markai_backend::features::pipeline::{Classifier, ImageAcquirer, Preprocessor};
use markai_backend::{AppState, PipelineError};

/// 以每张图的像素均值作为 AI 类 logit，便于区分不同图片
struct MeanLogits {
    calls: AtomicUsize,
}

impl Classifier for MeanLogits {
    fn infer(&self, batch: Array4<f32>) -> Result<Array2<f32>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let n = batch.shape()[0];
        let mut out = Array2::zeros((n, 2));
        for (i, item) in batch.axis_iter(Axis(0)).enumerate() {
            out[[i, 1]] = item.mean().unwrap_or(0.0);
        }
        Ok(out)
    }
}

struct Exploding;

impl Classifier for Exploding {
    fn infer(&self, _batch: Array4<f32>) -> Result<Array2<f32>, PipelineError> {
        Err(PipelineError::Inference("engine exploded".to_string()))
    }
}

struct Panicking;

impl Classifier for Panicking {
    fn infer(&self, _batch: Array4<f32>) -> Result<Array2<f32>, PipelineError> {
        panic!("runtime aborted");
    }
}

fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(color)));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

/// 本地图片服务：/white.png、/black.png、/garbage，其余 404
async fn spawn_image_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let white = png_bytes([255, 255, 255]);
    let black = png_bytes([0, 0, 0]);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let white = white.clone();
            let black = black.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (status, body): (&str, Vec<u8>) = match path.as_str() {
                    "/white.png" => ("200 OK", white),
                    "/black.png" => ("200 OK", black),
                    "/garbage" => ("200 OK", b"definitely not an image".to_vec()),
                    _ => ("404 Not Found", b"missing".to_vec()),
                };
                let header = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

fn new_state(classifier: Arc<dyn Classifier>, max_images: usize) -> AppState {
    AppState {
        classifier,
        acquirer: ImageAcquirer::new(reqwest::Client::new(), 1024 * 1024),
        preprocessor: Preprocessor::new(32),
        ai_class_index: 1,
        max_images,
        fetch_concurrency: 4,
    }
}

fn new_app(classifier: Arc<dyn Classifier>) -> Router {
    build_classify_app(new_state(classifier, 64), &CorsConfig::default())
}

async fn post_classify(app: Router, body: String) -> (StatusCode, Option<String>, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/classify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: Value = serde_json::from_slice(&bytes).expect("parse json");
    (status, content_type, json)
}

#[tokio::test]
async fn results_keep_request_order_with_isolated_failures() {
    let addr = spawn_image_server().await;
    let urls = vec![
        format!("http://{addr}/white.png"),
        format!("http://{addr}/missing.png"),
        format!("http://{addr}/black.png"),
        format!("http://{addr}/garbage"),
        format!("http://{addr}/white.png"),
    ];
    let app = new_app(Arc::new(MeanLogits {
        calls: AtomicUsize::new(0),
    }));

    let (status, _, json) = post_classify(app, json!({ "images": urls }).to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let results = json["results"].as_array().expect("results array");
    assert_eq!(results.len(), urls.len());
    for (result, url) in results.iter().zip(&urls) {
        assert_eq!(result["url"].as_str(), Some(url.as_str()));
    }

    for i in [0, 2, 4] {
        assert_eq!(results[i]["ok"], true);
        assert!(results[i]["error"].is_null());
        let p = results[i]["prob_ai"].as_f64().expect("prob_ai");
        assert!((0.0..=1.0).contains(&p));
    }
    for i in [1, 3] {
        assert_eq!(results[i]["ok"], false);
        assert!(results[i]["prob_ai"].is_null());
        let err = results[i]["error"].as_str().expect("error message");
        assert!(err.starts_with("Failed to process "), "{err}");
    }

    // 同一张图片在同一批次中概率完全一致
    assert_eq!(results[0]["prob_ai"], results[4]["prob_ai"]);
    let white = results[0]["prob_ai"].as_f64().expect("white");
    let black = results[2]["prob_ai"].as_f64().expect("black");
    assert!(white > black);
}

#[tokio::test]
async fn empty_list_skips_inference() {
    let classifier = Arc::new(MeanLogits {
        calls: AtomicUsize::new(0),
    });
    let app = new_app(classifier.clone());

    let (status, _, json) = post_classify(app, r#"{"images": []}"#.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "results": [] }));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_items_share_one_inference_call() {
    let addr = spawn_image_server().await;
    let classifier = Arc::new(MeanLogits {
        calls: AtomicUsize::new(0),
    });
    let app = new_app(classifier.clone());
    let urls = vec![
        format!("http://{addr}/white.png"),
        format!("http://{addr}/black.png"),
        format!("http://{addr}/white.png"),
    ];

    let (status, _, _) = post_classify(app, json!({ "images": urls }).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn all_failed_items_skip_inference() {
    let addr = spawn_image_server().await;
    let classifier = Arc::new(MeanLogits {
        calls: AtomicUsize::new(0),
    });
    let app = new_app(classifier.clone());
    let urls = vec![
        format!("http://{addr}/missing.png"),
        format!("http://{addr}/garbage"),
    ];

    let (status, _, json) = post_classify(app, json!({ "images": urls }).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().expect("results array");
    assert!(results.iter().all(|r| r["ok"] == false));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn inference_failure_marks_every_batched_item() {
    let addr = spawn_image_server().await;
    let urls = vec![
        format!("http://{addr}/white.png"),
        format!("http://{addr}/missing.png"),
        format!("http://{addr}/black.png"),
    ];
    let app = new_app(Arc::new(Exploding));

    let (status, _, json) = post_classify(app, json!({ "images": urls }).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().expect("results array");

    assert_eq!(
        results[0]["error"].as_str(),
        Some("Inference failed: engine exploded")
    );
    assert_eq!(results[0]["error"], results[2]["error"]);
    assert!(
        results[1]["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("Failed to process "))
    );
    assert!(results.iter().all(|r| r["ok"] == false));
}

#[tokio::test]
async fn panicking_engine_still_returns_per_item_results() {
    let addr = spawn_image_server().await;
    let urls = vec![
        format!("http://{addr}/white.png"),
        format!("http://{addr}/garbage"),
    ];
    let app = new_app(Arc::new(Panicking));

    let (status, _, json) = post_classify(app, json!({ "images": urls }).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert!(
        results[0]["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("Inference failed: "))
    );
    assert!(
        results[1]["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("Failed to process "))
    );
}

#[tokio::test]
async fn long_url_is_truncated_in_error_message() {
    // 端口 1 上没有服务，连接会被拒绝
    let url = format!("http://127.0.0.1:1/{}", "a".repeat(200));
    let app = new_app(Arc::new(Exploding));

    let (_, _, json) = post_classify(app, json!({ "images": [url] }).to_string()).await;
    let result = &json["results"][0];
    assert_eq!(result["url"].as_str(), Some(url.as_str()));

    let err = result["error"].as_str().expect("error message");
    let prefix: String = url.chars().take(100).collect();
    assert!(err.starts_with(&format!("Failed to process {prefix}: ")), "{err}");
    assert!(!err.contains(&url));
}

#[tokio::test]
async fn malformed_body_returns_problem_details() {
    let app = new_app(Arc::new(Exploding));

    let (status, content_type, json) = post_classify(app, "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/problem+json"));
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["requestId"].as_str().is_some_and(|v| !v.is_empty()));
}

#[tokio::test]
async fn too_many_images_is_rejected() {
    let app = build_classify_app(
        new_state(Arc::new(Exploding), 2),
        &CorsConfig::default(),
    );
    let body = json!({ "images": ["http://a.invalid/1", "http://a.invalid/2", "http://a.invalid/3"] });

    let (status, content_type, json) = post_classify(app, body.to_string()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(content_type.as_deref(), Some("application/problem+json"));
    assert_eq!(json["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn health_reports_service_identity() {
    let app = new_app(Arc::new(Exploding));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "markai-backend");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = new_app(Arc::new(Exploding));
    let req = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: Value = serde_json::from_slice(&bytes).expect("parse json");
    assert!(json["paths"]["/classify"].is_object());
}
