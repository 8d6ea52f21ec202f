use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::core::error::Result;
use crate::modules::backend::client::{BackendSession, DownloadedFile};
use crate::modules::backend::models::{Application, ApplicationTracking};

/// A document received from the visitor, ready to be forwarded
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Multipart field name the backend expects (e.g. "passport_copy")
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    fn into_part(self) -> Result<(String, reqwest::multipart::Part)> {
        let part = reqwest::multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(|e| {
                crate::core::error::AppError::BadRequest(format!("Invalid content type: {}", e))
            })?;
        Ok((self.field, part))
    }
}

/// Fields read off a passport scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PassportExtraction {
    #[serde(default, alias = "given_names")]
    pub first_name: Option<String>,
    #[serde(default, alias = "surname")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default, alias = "sex")]
    pub gender: Option<String>,
    #[serde(default, alias = "expiry_date")]
    pub passport_expiry: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

fn build_form(fields: Vec<(String, String)>, documents: Vec<DocumentUpload>) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for document in documents {
        let (field, part) = document.into_part()?;
        form = form.part(field, part);
    }
    Ok(form)
}

impl BackendSession {
    pub async fn submit_miscellaneous_application(
        &self,
        fields: Vec<(String, String)>,
        documents: Vec<DocumentUpload>,
    ) -> Result<Application> {
        tracing::info!(
            "Submitting miscellaneous application with {} document(s)",
            documents.len()
        );
        let form = build_form(fields, documents)?;
        self.send_multipart(
            "/applications/miscellaneous/submit",
            form,
            Some("application"),
            "application",
        )
        .await
    }

    pub async fn track_miscellaneous_application(
        &self,
        application_id: i64,
    ) -> Result<ApplicationTracking> {
        self.get(
            &format!("/applications/miscellaneous/{}/track", application_id),
            &[],
            Some("application"),
            "application tracking",
        )
        .await
    }

    pub async fn miscellaneous_filled_pdf(&self, application_id: i64) -> Result<DownloadedFile> {
        self.download(&format!(
            "/applications/miscellaneous/{}/filled-pdf",
            application_id
        ))
        .await
    }

    pub async fn download_application_file(&self, file_id: i64) -> Result<DownloadedFile> {
        self.download(&format!("/applications/files/{}/download", file_id))
            .await
    }

    pub async fn extract_passport(&self, scan: DocumentUpload) -> Result<PassportExtraction> {
        let form = build_form(Vec::new(), vec![scan])?;
        self.send_multipart("/ocr/passport", form, Some("extracted"), "passport extraction")
            .await
    }

    /// Attach a document to an application as an administrator
    pub async fn attach_application_file(
        &self,
        application_id: i64,
        document_type: Option<String>,
        document: DocumentUpload,
    ) -> Result<Value> {
        let fields = document_type
            .map(|t| vec![("document_type".to_string(), t)])
            .unwrap_or_default();
        let form = build_form(fields, vec![document])?;
        self.send_multipart(
            &format!("/admin/applications/miscellaneous/{}/files", application_id),
            form,
            Some("file"),
            "application file",
        )
        .await
    }
}
