//! Integration tests for the image-articles API
//!
//! These tests drive the whole router:
//! - HTTP routing under both the bare and `/api` prefixes
//! - Upload through to the storage seam
//! - The analysis record for that upload coming back as an article

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    multipart_body, response_json, setup_test_app, test_config, FakeBackend, FakeStorage,
    STORAGE_BASE,
};
use image_articles::backend::HttpAnalysisBackend;
use image_articles::model::{ArticleId, RawAnalysisRecord};
use image_articles::route::create_app;
use image_articles::state::AppState;

#[tokio::test]
async fn test_upload_then_browse_article() {
    let storage = Arc::new(FakeStorage::default());
    let backend = Arc::new(FakeBackend::default());
    let app = setup_test_app(&[], storage.clone(), backend.clone());

    // 2 MB JPEG under the default 10 MiB ceiling
    let jpeg = vec![0xFFu8; 2 * 1000 * 1000];
    let (content_type, body) = multipart_body("file", "Harbor.JPEG", "image/jpeg", &jpeg);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    let key = body["key"].as_str().unwrap().to_string();
    let file_url = body["fileUrl"].as_str().unwrap().to_string();

    assert!(key.ends_with(".jpeg"));
    assert!(file_url.starts_with("https://"));
    assert!(file_url.contains(&key));
    assert_eq!(storage.put_count(), 1);

    // The backend later produces a record for the stored key.
    backend.records.lock().unwrap().push(RawAnalysisRecord {
        id: Some(ArticleId::Text("a1b2c3".to_string())),
        image_id: Some(key.clone()),
        article: Some("A quiet harbor at dawn.".to_string()),
        detected_labels: Some(vec!["Boat".to_string(), "Water".to_string()]),
        timestamp: Some("2025-01-05T06:30:00.000000".to_string()),
        ..RawAnalysisRecord::default()
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/articles?page=1&pageSize=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response.into_body()).await;
    let article = &body["articles"][0];
    assert_eq!(article["id"], "a1b2c3");
    assert_eq!(article["imageUrl"], file_url.as_str());
    assert!(article["imageUrl"].as_str().unwrap().starts_with(STORAGE_BASE));
    assert_eq!(article["title"], format!("Analysis of {key}"));
    assert_eq!(article["date"], "January 5, 2025");
}

#[tokio::test]
async fn test_health() {
    let app = setup_test_app(
        &[],
        Arc::new(FakeStorage::default()),
        Arc::new(FakeBackend::default()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = setup_test_app(
        &[],
        Arc::new(FakeStorage::default()),
        Arc::new(FakeBackend::default()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_survives_a_malformed_backend_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "image_id": "good.png", "Timestamp": "2025-01-05T10:00:00" },
            { "image_id": "bad.png", "Timestamp": 1736071200 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/articles/gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResponseMetadata": { "HTTPStatusCode": 200 }
        })))
        .mount(&server)
        .await;

    let config = test_config(&[]);
    let backend = HttpAnalysisBackend::new(reqwest::Client::new(), server.uri(), config.retry);
    let app = create_app(AppState::new(
        config,
        Arc::new(FakeStorage::default()),
        Arc::new(backend),
    ));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/articles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response.into_body()).await;
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0]["date"], "January 5, 2025");
    assert_eq!(articles[1]["imageUrl"], format!("{STORAGE_BASE}/bad.png"));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/articles/gone")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
