use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::admin::handlers::{self, resource_handlers};
use crate::features::admin::resource::{
    AdminResource, Applications, Appointments, Centers, Counters, MiscellaneousApplications,
    NotificationTemplates, ServiceDetails, Services, TimeSlots,
};
use crate::features::admin::services::AdminService;

/// `/api/admin/{name}`, `/api/admin/{name}/{id}` and, when offered,
/// `/api/admin/{name}/{id}/toggle`
pub fn resource_routes<R: AdminResource>() -> Router<Arc<AdminService>> {
    let collection_path = format!("/api/admin/{}", R::NAME);
    let item_path = format!("{}/{{id}}", collection_path);

    let mut collection = get(resource_handlers::list::<R>);
    if R::SUPPORTS_CREATE {
        collection = collection.post(resource_handlers::create::<R>);
    }

    let mut item = get(resource_handlers::get_one::<R>).put(resource_handlers::update::<R>);
    if R::SUPPORTS_DELETE {
        item = item.delete(resource_handlers::delete::<R>);
    }

    let mut router = Router::new()
        .route(&collection_path, collection)
        .route(&item_path, item);
    if R::SUPPORTS_TOGGLE {
        router = router.route(
            &format!("{}/toggle", item_path),
            patch(resource_handlers::toggle::<R>),
        );
    }
    router
}

pub fn routes(service: Arc<AdminService>) -> Router {
    Router::new()
        .merge(resource_routes::<Services>())
        .merge(resource_routes::<ServiceDetails>())
        .merge(resource_routes::<Centers>())
        .merge(resource_routes::<Counters>())
        .merge(resource_routes::<TimeSlots>())
        .merge(resource_routes::<Applications>())
        .merge(resource_routes::<MiscellaneousApplications>())
        .merge(resource_routes::<Appointments>())
        .merge(resource_routes::<NotificationTemplates>())
        .route(
            "/api/admin/time-slots/bulk-create",
            post(handlers::bulk_create_slots),
        )
        .route(
            "/api/admin/time-slots/bulk-toggle",
            patch(handlers::bulk_toggle_slots),
        )
        .route(
            "/api/admin/applications/miscellaneous/{id}/files",
            post(handlers::attach_application_file),
        )
        .route(
            "/api/admin/notification-templates/preview",
            post(handlers::preview_template),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::SessionContext;
    use crate::shared::test_helpers::{
        backend_client, spawn_mock_backend, with_admin_session, with_session, RecordedRequests,
    };
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::put,
        Json,
    };
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn mock_backend(recorded: RecordedRequests) -> Router {
        let record = move |headers: HeaderMap| {
            let recorded = recorded.clone();
            async move {
                recorded.record(&headers);
                Json(json!({
                    "success": true,
                    "application": {"id": 8, "status": "rejected", "admin_notes": "Unreadable scan"}
                }))
            }
        };
        Router::new()
            .route("/admin/applications/miscellaneous/{id}", put(record.clone()))
            .route("/admin/applications/{id}", put(record.clone()))
            .route("/admin/time-slots/bulk-create", post(record))
            .route(
                "/admin/applications/miscellaneous/{id}/files",
                post(|| async {
                    Json(json!({
                        "success": true,
                        "file": {"id": 11, "original_filename": "notes.pdf", "document_type": "decision_letter"}
                    }))
                }),
            )
            .route(
                "/admin/centers",
                post(|Json(body): Json<Value>| async move {
                    let mut center = body;
                    center["id"] = json!(14);
                    (
                        StatusCode::CREATED,
                        Json(json!({"success": true, "center": center})),
                    )
                }),
            )
            .route(
                "/admin/centers/{id}",
                put(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                    let mut center = body;
                    center["id"] = json!(id);
                    Json(json!({"success": true, "center": center}))
                }),
            )
            .route(
                "/admin/services/{id}/toggle",
                patch(|| async {
                    Json(json!({"success": true, "service": {"id": 3, "title": "Visa", "is_active": false}}))
                }),
            )
    }

    async fn admin_server(recorded: RecordedRequests) -> TestServer {
        let client = backend_client(spawn_mock_backend(mock_backend(recorded)).await);
        let app = with_admin_session(routes(Arc::new(AdminService::new(client))));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_rejection_without_notes_never_reaches_backend() {
        let recorded = RecordedRequests::default();
        let server = admin_server(recorded.clone()).await;

        let response = server
            .put("/api/admin/applications/miscellaneous/8")
            .json(&json!({"status": "rejected", "admin_notes": ""}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(
            body["errors"][0],
            "Admin notes are required when rejecting an application"
        );
        assert_eq!(recorded.count(), 0);
    }

    #[tokio::test]
    async fn test_rejection_with_notes_is_forwarded_with_csrf() {
        let recorded = RecordedRequests::default();
        let server = admin_server(recorded.clone()).await;

        let response = server
            .put("/api/admin/applications/miscellaneous/8")
            .json(&json!({"status": "rejected", "admin_notes": "Unreadable scan"}))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["status"], "rejected");
        let requests = recorded.all();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["x-csrf-token"], "test-csrf");
    }

    #[tokio::test]
    async fn test_general_applications_cannot_be_deleted() {
        let server = admin_server(RecordedRequests::default()).await;

        let response = server.delete("/api/admin/applications/8").await;
        assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_create_and_update_center() {
        let server = admin_server(RecordedRequests::default()).await;

        let created = server
            .post("/api/admin/centers")
            .json(&json!({"name": "Lagos Consulate", "city": "Lagos"}))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);
        let body = created.json::<Value>();
        assert_eq!(body["data"]["id"], 14);
        assert_eq!(body["message"], "Center created");

        let updated = server
            .put("/api/admin/centers/14")
            .json(&json!({"name": "Abuja Consulate", "is_active": false}))
            .await;
        updated.assert_status_ok();
        assert_eq!(updated.json::<Value>()["data"]["name"], "Abuja Consulate");
    }

    #[tokio::test]
    async fn test_toggle() {
        let server = admin_server(RecordedRequests::default()).await;

        let response = server.patch("/api/admin/services/3/toggle").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["is_active"], false);
    }

    #[tokio::test]
    async fn test_bulk_create_rejects_empty_range_locally() {
        let recorded = RecordedRequests::default();
        let server = admin_server(recorded.clone()).await;

        let response = server
            .post("/api/admin/time-slots/bulk-create")
            .json(&json!({"start_time": "10:00", "end_time": "10:00", "duration_minutes": 30}))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(recorded.count(), 0);
    }

    #[tokio::test]
    async fn test_attach_document() {
        let server = admin_server(RecordedRequests::default()).await;

        let form = MultipartForm::new()
            .add_text("document_type", "decision_letter")
            .add_part(
                "file",
                Part::bytes(b"%PDF-1.4".to_vec())
                    .file_name("notes.pdf")
                    .mime_type("application/pdf"),
            );
        let response = server
            .post("/api/admin/applications/miscellaneous/8/files")
            .multipart(form)
            .await;

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["data"]["id"], 11);
    }

    #[tokio::test]
    async fn test_attach_without_file_is_rejected() {
        let server = admin_server(RecordedRequests::default()).await;

        let response = server
            .post("/api/admin/applications/miscellaneous/8/files")
            .multipart(MultipartForm::new().add_text("document_type", "decision_letter"))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_anonymous_visitor_is_unauthorized() {
        let client = backend_client(spawn_mock_backend(Router::new()).await);
        let app = with_session(
            routes(Arc::new(AdminService::new(client))),
            SessionContext::anonymous(Uuid::new_v4()),
        );
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/admin/centers").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
