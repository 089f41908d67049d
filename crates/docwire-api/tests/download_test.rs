mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use chrono::Duration as ChronoDuration;
use helpers::{setup_test_app, MockGateway, TestApp};
use serde_json::Value;

async fn deliver_and_grant_path(app: &TestApp, bytes: Vec<u8>) -> String {
    let form = MultipartForm::new()
        .add_text("phoneNumber", "9876543210")
        .add_part(
            "pdf",
            Part::bytes(bytes)
                .file_name("receipt.pdf")
                .mime_type("application/pdf"),
        );

    let response = app.server.post("/api/upload/send-pdf").multipart(form).await;
    response.assert_status_ok();

    let document_url = app.gateway.calls().await[0].document_url.clone();
    document_url
        .strip_prefix("http://localhost:3000")
        .expect("grant URL uses the configured base")
        .to_string()
}

#[tokio::test]
async fn valid_grant_streams_the_document() {
    let app = setup_test_app(MockGateway::new()).await;
    let bytes = b"%PDF-1.4 download me".to_vec();
    let path = deliver_and_grant_path(&app, bytes.clone()).await;

    let response = app.server.get(&path).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().to_vec(), bytes);

    assert_eq!(response.header("content-type"), "application/pdf");
    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("inline; filename=\""));
    assert!(disposition.contains("receipt.pdf"));
}

#[tokio::test]
async fn grant_can_be_resolved_repeatedly_within_ttl() {
    let app = setup_test_app(MockGateway::new()).await;
    let path = deliver_and_grant_path(&app, b"%PDF-1.4 twice".to_vec()).await;

    app.server.get(&path).await.assert_status_ok();
    app.server.get(&path).await.assert_status_ok();
}

#[tokio::test]
async fn expired_grant_is_evicted_and_stays_gone() {
    let app = setup_test_app(MockGateway::new()).await;
    let path = deliver_and_grant_path(&app, b"%PDF-1.4 expiring".to_vec()).await;

    // TTL is 10 minutes; one minute past it the grant is dead
    app.clock.advance(ChronoDuration::minutes(11));

    let response = app.server.get(&path).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "File not found or link has expired");

    // Evicted on first resolve; the second attempt reports the same absence
    assert_eq!(app.state.grants.len().await, 0);
    app.server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_grant_returns_not_found() {
    let app = setup_test_app(MockGateway::new()).await;

    let response = app
        .server
        .get("/download/00000000-0000-0000-0000-000000000000")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_grant_id_returns_not_found() {
    let app = setup_test_app(MockGateway::new()).await;

    let response = app.server.get("/download/not-a-uuid").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "File not found or link has expired");
}

#[tokio::test]
async fn grant_for_missing_file_returns_not_found() {
    let app = setup_test_app(MockGateway::new()).await;
    let path = deliver_and_grant_path(&app, b"%PDF-1.4 vanishing".to_vec()).await;

    // Operator deletes the file out from under a still-valid grant
    let uploads = app._temp_dir.path().join("uploads").join("documents");
    for entry in std::fs::read_dir(&uploads).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }

    let response = app.server.get(&path).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "File not found");
}
