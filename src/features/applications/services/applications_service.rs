use crate::core::error::{AppError, Result};
use crate::features::applications::dtos::MiscellaneousApplicationForm;
use crate::features::auth::model::SessionContext;
use crate::modules::backend::{
    Application, ApplicationTracking, BackendClient, DocumentUpload, DownloadedFile,
    PassportExtraction,
};

/// Miscellaneous applications and the documents that travel with them
pub struct ApplicationsService {
    client: BackendClient,
}

fn not_found(what: &str, id: i64) -> impl FnOnce(AppError) -> AppError + '_ {
    move |e| match e {
        AppError::Backend { status: 404, .. } => {
            AppError::NotFound(format!("{} {} not found", what, id))
        }
        other => other,
    }
}

impl ApplicationsService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Forward a validated form and its documents to the backend
    pub async fn submit(
        &self,
        session: &SessionContext,
        form: MiscellaneousApplicationForm,
        documents: Vec<DocumentUpload>,
    ) -> Result<Application> {
        let application = self
            .client
            .session(session.credentials.clone())
            .submit_miscellaneous_application(form.into_backend_fields(), documents)
            .await?;

        tracing::info!("Miscellaneous application {} submitted", application.id);
        Ok(application)
    }

    pub async fn track(
        &self,
        session: &SessionContext,
        application_id: i64,
    ) -> Result<ApplicationTracking> {
        self.client
            .session(session.credentials.clone())
            .track_miscellaneous_application(application_id)
            .await
            .map_err(not_found("Application", application_id))
    }

    pub async fn filled_pdf(
        &self,
        session: &SessionContext,
        application_id: i64,
    ) -> Result<DownloadedFile> {
        self.client
            .session(session.credentials.clone())
            .miscellaneous_filled_pdf(application_id)
            .await
            .map_err(not_found("Application", application_id))
    }

    pub async fn download_file(
        &self,
        session: &SessionContext,
        file_id: i64,
    ) -> Result<DownloadedFile> {
        self.client
            .session(session.credentials.clone())
            .download_application_file(file_id)
            .await
            .map_err(not_found("File", file_id))
    }

    pub async fn extract_passport(
        &self,
        session: &SessionContext,
        scan: DocumentUpload,
    ) -> Result<PassportExtraction> {
        self.client
            .session(session.credentials.clone())
            .extract_passport(scan)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{backend_client, spawn_mock_backend};
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_track_maps_backend_404_to_not_found() {
        let router = Router::new().route(
            "/applications/miscellaneous/{id}/track",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"success": false, "error": {"message": "No such application"}})),
                )
            }),
        );
        let service = ApplicationsService::new(backend_client(spawn_mock_backend(router).await));

        let err = service
            .track(&SessionContext::anonymous(Uuid::new_v4()), 77)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Application 77 not found"));
    }

    #[tokio::test]
    async fn test_track_returns_status() {
        let router = Router::new().route(
            "/applications/miscellaneous/{id}/track",
            get(|| async {
                Json(json!({
                    "success": true,
                    "application": {"id": 12, "status": "in-progress", "reference_number": "MA-12"}
                }))
            }),
        );
        let service = ApplicationsService::new(backend_client(spawn_mock_backend(router).await));

        let tracking = service
            .track(&SessionContext::anonymous(Uuid::new_v4()), 12)
            .await
            .unwrap();
        assert_eq!(tracking.reference_number.as_deref(), Some("MA-12"));
        assert_eq!(
            tracking.status,
            crate::modules::backend::ApplicationStatus::InProgress
        );
    }
}
