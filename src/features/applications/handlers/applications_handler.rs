use axum::{
    extract::{Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::Result;
use crate::features::applications::dtos::{
    MiscellaneousApplicationForm, MiscellaneousApplicationUpload, PassportScanUpload,
};
use crate::features::applications::services::ApplicationsService;
use crate::features::auth::model::SessionContext;
use crate::modules::backend::{
    Application, ApplicationTracking, DownloadedFile, PassportExtraction,
};
use crate::shared::types::ApiResponse;
use crate::shared::upload::UploadForm;

/// Relay a backend file, keeping its headers where it sent them
pub fn file_response(file: DownloadedFile, fallback_name: &str) -> Response {
    let disposition = file
        .content_disposition
        .and_then(|d| HeaderValue::from_str(&d).ok())
        .or_else(|| {
            HeaderValue::from_str(&format!(
                "attachment; filename*=UTF-8''{}",
                urlencoding::encode(fallback_name)
            ))
            .ok()
        });
    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = (StatusCode::OK, file.bytes).into_response();
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    if let Some(disposition) = disposition {
        response.headers_mut().insert(CONTENT_DISPOSITION, disposition);
    }
    response
}

/// Submit a miscellaneous application with its documents
///
/// Text fields are validated before anything is sent to the backend. Every
/// file part is forwarded under its own part name.
#[utoipa::path(
    post,
    path = "/api/applications/miscellaneous",
    tag = "applications",
    request_body(
        content = MiscellaneousApplicationUpload,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Application submitted", body = ApiResponse<Application>),
        (status = 400, description = "Validation error or rejected document")
    )
)]
pub async fn submit_application(
    session: SessionContext,
    State(service): State<Arc<ApplicationsService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Application>>)> {
    let upload = UploadForm::read(multipart).await?;
    let form = MiscellaneousApplicationForm::from_upload(&upload);
    form.validate()?;

    let application = service.submit(&session, form, upload.documents).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(application),
            Some("Application submitted".to_string()),
            None,
        )),
    ))
}

/// Track the status of a miscellaneous application
#[utoipa::path(
    get,
    path = "/api/applications/miscellaneous/{id}/track",
    tag = "applications",
    params(("id" = i64, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application status", body = ApiResponse<ApplicationTracking>),
        (status = 404, description = "Application not found")
    )
)]
pub async fn track_application(
    session: SessionContext,
    State(service): State<Arc<ApplicationsService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ApplicationTracking>>> {
    let tracking = service.track(&session, id).await?;
    Ok(Json(ApiResponse::success(Some(tracking), None, None)))
}

/// Download the backend-filled PDF of an application
#[utoipa::path(
    get,
    path = "/api/applications/miscellaneous/{id}/filled-pdf",
    tag = "applications",
    params(("id" = i64, Path, description = "Application ID")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn download_filled_pdf(
    session: SessionContext,
    State(service): State<Arc<ApplicationsService>>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let file = service.filled_pdf(&session, id).await?;
    Ok(file_response(file, &format!("application-{}.pdf", id)))
}

/// Download a document attached to an application
#[utoipa::path(
    get,
    path = "/api/applications/files/{id}/download",
    tag = "applications",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_file(
    session: SessionContext,
    State(service): State<Arc<ApplicationsService>>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let file = service.download_file(&session, id).await?;
    Ok(file_response(file, &format!("document-{}", id)))
}

/// Read the fields off a passport scan
#[utoipa::path(
    post,
    path = "/api/documents/passport-ocr",
    tag = "applications",
    request_body(content = PassportScanUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extracted passport fields", body = ApiResponse<PassportExtraction>),
        (status = 400, description = "Missing or rejected scan")
    )
)]
pub async fn extract_passport(
    session: SessionContext,
    State(service): State<Arc<ApplicationsService>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PassportExtraction>>> {
    let scan = UploadForm::read(multipart)
        .await?
        .into_single_document("passport")?;

    let extracted = service.extract_passport(&session, scan).await?;
    Ok(Json(ApiResponse::success(Some(extracted), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_response_falls_back_to_encoded_name() {
        let response = file_response(
            DownloadedFile {
                content_type: "application/pdf".to_string(),
                content_disposition: None,
                bytes: b"%PDF".to_vec(),
            },
            "dossier été.pdf",
        );

        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename*=UTF-8''dossier%20%C3%A9t%C3%A9.pdf"
        );
    }

    #[test]
    fn test_file_response_keeps_backend_disposition() {
        let response = file_response(
            DownloadedFile {
                content_type: "image/png".to_string(),
                content_disposition: Some("inline; filename=\"scan.png\"".to_string()),
                bytes: vec![1, 2, 3],
            },
            "ignored",
        );

        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "inline; filename=\"scan.png\""
        );
    }
}
