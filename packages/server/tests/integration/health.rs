use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;
    assert_eq!(res.status, 200, "body: {}", res.text);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::OPENAPI).await;
    assert_eq!(res.status, 200);
    assert!(res.body["paths"]["/api/v1/listings"].is_object());
    assert!(res.body["paths"]["/api/v1/moderation/listings/{id}/approve"].is_object());
}
