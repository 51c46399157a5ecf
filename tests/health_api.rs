mod common;

use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}
