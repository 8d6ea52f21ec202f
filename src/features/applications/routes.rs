use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::applications::handlers;
use crate::features::applications::services::ApplicationsService;

pub fn routes(service: Arc<ApplicationsService>) -> Router {
    Router::new()
        .route(
            "/api/applications/miscellaneous",
            post(handlers::submit_application),
        )
        .route(
            "/api/applications/miscellaneous/{id}/track",
            get(handlers::track_application),
        )
        .route(
            "/api/applications/miscellaneous/{id}/filled-pdf",
            get(handlers::download_filled_pdf),
        )
        .route(
            "/api/applications/files/{id}/download",
            get(handlers::download_file),
        )
        .route(
            "/api/documents/passport-ocr",
            post(handlers::extract_passport),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::SessionContext;
    use crate::shared::test_helpers::{
        backend_client, spawn_mock_backend, with_session, RecordedRequests,
    };
    use axum::{http::HeaderMap, Json};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    async fn server(recorded: RecordedRequests) -> TestServer {
        let backend = Router::new()
            .route(
                "/applications/miscellaneous/submit",
                post(move |headers: HeaderMap| {
                    let recorded = recorded.clone();
                    async move {
                        recorded.record(&headers);
                        Json(json!({
                            "success": true,
                            "application": {"id": 44, "status": "submitted", "reference_number": "MA-44"}
                        }))
                    }
                }),
            )
            .route(
                "/ocr/passport",
                post(|| async {
                    Json(json!({
                        "success": true,
                        "extracted": {"surname": "LOVELACE", "given_names": "ADA", "passport_number": "A1234567"}
                    }))
                }),
            );
        let client = backend_client(spawn_mock_backend(backend).await);
        let app = with_session(
            routes(Arc::new(ApplicationsService::new(client))),
            SessionContext::anonymous(Uuid::new_v4()),
        );
        TestServer::new(app).unwrap()
    }

    fn form(email: &str) -> MultipartForm {
        MultipartForm::new()
            .add_text("service_type", "Document attestation")
            .add_text("first_name", "Ada")
            .add_text("last_name", "Lovelace")
            .add_text("email", email)
            .add_text("phone", "+44 20 7946 0000")
            .add_part(
                "passport_copy",
                Part::bytes(b"%PDF-1.4".to_vec())
                    .file_name("passport.pdf")
                    .mime_type("application/pdf"),
            )
    }

    #[tokio::test]
    async fn test_submit_application() {
        let recorded = RecordedRequests::default();
        let server = server(recorded.clone()).await;

        let response = server
            .post("/api/applications/miscellaneous")
            .multipart(form("a@b.com"))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["data"]["reference_number"], "MA-44");
        assert_eq!(recorded.count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backend() {
        let recorded = RecordedRequests::default();
        let server = server(recorded.clone()).await;

        let response = server
            .post("/api/applications/miscellaneous")
            .multipart(form("not-an-email"))
            .await;

        assert_eq!(response.status_code(), 400);
        let body = response.json::<Value>();
        assert_eq!(body["errors"][0], "Please enter a valid email address");
        assert_eq!(recorded.count(), 0);
    }

    #[tokio::test]
    async fn test_disallowed_document_type_is_rejected() {
        let recorded = RecordedRequests::default();
        let server = server(recorded.clone()).await;

        let response = server
            .post("/api/applications/miscellaneous")
            .multipart(form("a@b.com").add_part(
                "extra",
                Part::bytes(b"PK".to_vec())
                    .file_name("bundle.zip")
                    .mime_type("application/zip"),
            ))
            .await;

        assert_eq!(response.status_code(), 400);
        assert_eq!(recorded.count(), 0);
    }

    #[tokio::test]
    async fn test_passport_ocr() {
        let server = server(RecordedRequests::default()).await;

        let response = server
            .post("/api/documents/passport-ocr")
            .multipart(
                MultipartForm::new().add_part(
                    "passport",
                    Part::bytes(vec![0xFF, 0xD8, 0xFF])
                        .file_name("passport.jpg")
                        .mime_type("image/jpeg"),
                ),
            )
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["data"]["first_name"], "ADA");
        assert_eq!(body["data"]["passport_number"], "A1234567");
    }
}
