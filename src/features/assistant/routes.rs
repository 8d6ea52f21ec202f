use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::assistant::handlers;
use crate::features::assistant::services::AssistantService;

pub fn routes(service: Arc<AssistantService>) -> Router {
    Router::new()
        .route("/api/assistant", post(handlers::start_conversation))
        .route("/api/assistant/reply", post(handlers::reply))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::SessionContext;
    use crate::shared::test_helpers::{backend_client, spawn_mock_backend, with_session};
    use axum::{routing::get, Json};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_conversation_over_http() {
        let backend = Router::new().route(
            "/booking/services",
            get(|| async { Json(json!({"success": true, "services": []})) }),
        );
        let client = backend_client(spawn_mock_backend(backend).await);
        let app = with_session(
            routes(Arc::new(AssistantService::new(client, Duration::from_secs(60)))),
            SessionContext::anonymous(Uuid::new_v4()),
        );
        let server = TestServer::new(app).unwrap();

        let greeting = server.post("/api/assistant").await.json::<Value>();
        assert_eq!(
            greeting["data"]["options"][0]["label"],
            "Check Appointment Availability"
        );

        let response = server
            .post("/api/assistant/reply")
            .json(&json!({"option": "check_availability"}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["data"]["options"], json!([{"id": "restart", "label": "Start over"}]));

        let response = server
            .post("/api/assistant/reply")
            .json(&json!({"option": ""}))
            .await;
        assert_eq!(response.status_code(), 400);
    }
}
