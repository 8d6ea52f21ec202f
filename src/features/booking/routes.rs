use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::booking::handlers;
use crate::features::booking::services::BookingService;

pub fn routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route(
            "/api/booking/wizard",
            post(handlers::start_wizard).get(handlers::get_wizard),
        )
        .route("/api/booking/wizard/service", put(handlers::select_service))
        .route("/api/booking/wizard/center", put(handlers::select_center))
        .route(
            "/api/booking/wizard/applicant",
            put(handlers::update_applicant),
        )
        .route("/api/booking/wizard/date", put(handlers::select_date))
        .route("/api/booking/wizard/slot", put(handlers::select_slot))
        .route("/api/booking/wizard/next", post(handlers::next_step))
        .route("/api/booking/wizard/back", post(handlers::previous_step))
        .route("/api/booking/wizard/submit", post(handlers::submit_booking))
        .route("/api/booking/wizard/reset", post(handlers::reset_wizard))
        .route(
            "/api/booking/wizard/confirmation",
            get(handlers::print_confirmation),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::SessionContext;
    use crate::shared::test_helpers::{backend_client, spawn_mock_backend, with_session};
    use axum::{http::StatusCode, Json};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::time::Duration;
    use uuid::Uuid;

    async fn server() -> TestServer {
        server_for(SessionContext::anonymous(Uuid::new_v4())).await
    }

    async fn server_for(session: SessionContext) -> TestServer {
        let backend = Router::new()
            .route(
                "/booking/services",
                get(|| async {
                    Json(json!({"success": true, "services": [
                        {"id": 1, "title": "Passport Renewal"}
                    ]}))
                }),
            )
            .route(
                "/booking/centers/{id}",
                get(|| async {
                    Json(json!({"success": true, "centers": [
                        {"id": 5, "name": "Central Verification Center"}
                    ]}))
                }),
            );
        let client = backend_client(spawn_mock_backend(backend).await);
        let service = Arc::new(BookingService::new(client, Duration::from_secs(60)));
        let app = with_session(routes(service), session);
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_wizard_over_http() {
        let server = server().await;

        let started = server.post("/api/booking/wizard").await;
        started.assert_status_ok();
        let body = started.json::<Value>();
        assert_eq!(body["data"]["step"], 1);
        assert_eq!(body["data"]["services"][0]["title"], "Passport Renewal");

        let blocked = server.post("/api/booking/wizard/next").await;
        assert_eq!(blocked.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            blocked.json::<Value>()["errors"][0],
            "Please select a service"
        );

        server
            .put("/api/booking/wizard/service")
            .json(&json!({"serviceId": 1}))
            .await
            .assert_status_ok();
        let advanced = server.post("/api/booking/wizard/next").await.json::<Value>();
        assert_eq!(advanced["data"]["step"], 2);
        assert_eq!(
            advanced["data"]["centers"][0]["name"],
            "Central Verification Center"
        );
    }

    #[tokio::test]
    async fn test_starting_a_booking_keeps_the_session() {
        let session = SessionContext::anonymous(Uuid::new_v4());
        let server = server_for(session.clone()).await;

        let missing = server.get("/api/booking/wizard").await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert!(!session.is_kept());

        server.post("/api/booking/wizard").await.assert_status_ok();
        assert!(session.is_kept());
    }

    #[tokio::test]
    async fn test_confirmation_requires_completed_booking() {
        let server = server().await;
        server.post("/api/booking/wizard").await.assert_status_ok();

        let response = server.get("/api/booking/wizard/confirmation").await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
