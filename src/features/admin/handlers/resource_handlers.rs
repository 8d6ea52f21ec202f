use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::admin::dtos::AdminListQuery;
use crate::features::admin::resource::AdminResource;
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireAdmin;
use crate::shared::types::{ApiResponse, Meta};

pub async fn list<R: AdminResource>(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<ApiResponse<Vec<R::Record>>>> {
    let (items, total) = service.list::<R>(&session, &query).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

pub async fn get_one<R: AdminResource>(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<R::Record>>> {
    let record = service.get::<R>(&session, &id).await?;
    Ok(Json(ApiResponse::success(Some(record), None, None)))
}

pub async fn create<R: AdminResource>(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    AppJson(payload): AppJson<R::Create>,
) -> Result<(StatusCode, Json<ApiResponse<R::Record>>)> {
    payload.validate()?;

    let record = service.create::<R>(&session, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(record),
            Some(format!("{} created", R::LABEL)),
            None,
        )),
    ))
}

pub async fn update<R: AdminResource>(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<R::Update>,
) -> Result<Json<ApiResponse<R::Record>>> {
    payload.validate()?;

    let record = service.update::<R>(&session, &id, &payload).await?;
    Ok(Json(ApiResponse::success(
        Some(record),
        Some(format!("{} updated", R::LABEL)),
        None,
    )))
}

pub async fn delete<R: AdminResource>(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete::<R>(&session, &id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("{} deleted", R::LABEL)),
        None,
    )))
}

pub async fn toggle<R: AdminResource>(
    RequireAdmin(session): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<R::Record>>> {
    let record = service.toggle::<R>(&session, &id).await?;
    Ok(Json(ApiResponse::success(Some(record), None, None)))
}
