use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::admin::dtos::{
    AttachFileUpload, BulkCreateSlotsDto, BulkCreateSlotsResponseDto, BulkToggleSlotsDto,
    BulkToggleSlotsResponseDto, TemplatePreviewDto, TemplatePreviewResponseDto,
};
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireAdmin;
use crate::shared::types::ApiResponse;
use crate::shared::upload::UploadForm;

/// Generate back-to-back time slots and create them in one request
#[utoipa::path(
    post,
    path = "/api/admin/time-slots/bulk-create",
    request_body = BulkCreateSlotsDto,
    responses(
        (status = 201, description = "Slots created", body = ApiResponse<BulkCreateSlotsResponseDto>),
        (status = 400, description = "Empty or invalid time range"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin"
)]
pub async fn bulk_create_slots(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    AppJson(dto): AppJson<BulkCreateSlotsDto>,
) -> Result<(StatusCode, Json<ApiResponse<BulkCreateSlotsResponseDto>>)> {
    dto.validate()?;

    let slots = service.bulk_create_slots(&session, &dto).await?;
    let created = slots.len();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(BulkCreateSlotsResponseDto { created, slots }),
            Some(format!("{} time slot(s) created", created)),
            None,
        )),
    ))
}

/// Activate or deactivate several time slots
#[utoipa::path(
    patch,
    path = "/api/admin/time-slots/bulk-toggle",
    request_body = BulkToggleSlotsDto,
    responses(
        (status = 200, description = "Slots updated", body = ApiResponse<BulkToggleSlotsResponseDto>),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin"
)]
pub async fn bulk_toggle_slots(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    AppJson(dto): AppJson<BulkToggleSlotsDto>,
) -> Result<Json<ApiResponse<BulkToggleSlotsResponseDto>>> {
    dto.validate()?;

    let updated = service.bulk_toggle_slots(&session, &dto).await?;
    Ok(Json(ApiResponse::success(
        Some(BulkToggleSlotsResponseDto { updated }),
        None,
        None,
    )))
}

/// Attach a document to a miscellaneous application
#[utoipa::path(
    post,
    path = "/api/admin/applications/miscellaneous/{id}/files",
    params(("id" = i64, Path, description = "Application ID")),
    request_body(content = AttachFileUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document attached"),
        (status = 400, description = "Missing or rejected file"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin"
)]
pub async fn attach_application_file(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Value>>)> {
    let upload = UploadForm::read(multipart).await?;
    let document_type = upload.text("document_type");
    let document = upload.into_single_document("file")?;

    let file = service
        .attach_application_file(&session, id, document_type, document)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(file),
            Some("Document attached".to_string()),
            None,
        )),
    ))
}

/// Render a notification template with sample values
#[utoipa::path(
    post,
    path = "/api/admin/notification-templates/preview",
    request_body = TemplatePreviewDto,
    responses(
        (status = 200, description = "Rendered subject and body", body = ApiResponse<TemplatePreviewResponseDto>),
        (status = 400, description = "Template syntax error"),
        (status = 403, description = "Admin access required")
    ),
    tag = "admin"
)]
pub async fn preview_template(
    RequireAdmin(_session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    AppJson(dto): AppJson<TemplatePreviewDto>,
) -> Result<Json<ApiResponse<TemplatePreviewResponseDto>>> {
    dto.validate()?;

    let preview = service.preview_template(&dto)?;
    Ok(Json(ApiResponse::success(Some(preview), None, None)))
}
