use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::auth::model::SessionContext;
use crate::features::catalog::dtos::{ListServicesQuery, ServiceGroupDto, ServiceListingDto};
use crate::features::catalog::services::CatalogService;
use crate::modules::backend::{Center, Service, ServiceCategory};
use crate::shared::types::{ApiResponse, Meta};

/// List bookable services
///
/// Returns a flat list or, with `grouped=true`, services grouped by category.
#[utoipa::path(
    get,
    path = "/api/services",
    params(ListServicesQuery),
    responses(
        (status = 200, description = "List of services", body = ApiResponse<ServiceListingDto>),
    ),
    tag = "catalog"
)]
pub async fn list_services(
    session: SessionContext,
    State(service): State<Arc<CatalogService>>,
    Query(query): Query<ListServicesQuery>,
) -> Result<Json<ApiResponse<ServiceListingDto>>> {
    let services = service.list_services(&session, &query).await?;
    let total = services.len() as i64;

    let listing = if query.grouped {
        ServiceListingDto::Grouped(ServiceGroupDto::group(services))
    } else {
        ServiceListingDto::Flat(services)
    };

    Ok(Json(ApiResponse::success(
        Some(listing),
        None,
        Some(Meta { total }),
    )))
}

/// List service categories
#[utoipa::path(
    get,
    path = "/api/services/categories",
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<ServiceCategory>>),
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    session: SessionContext,
    State(service): State<Arc<CatalogService>>,
) -> Result<Json<ApiResponse<Vec<ServiceCategory>>>> {
    let categories = service.list_categories(&session).await?;
    Ok(Json(ApiResponse::success(Some(categories), None, None)))
}

/// Get a service with its fees and required documents
#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(
        ("id" = i64, Path, description = "Service ID")
    ),
    responses(
        (status = 200, description = "Service found", body = ApiResponse<Service>),
        (status = 404, description = "Service not found")
    ),
    tag = "catalog"
)]
pub async fn get_service(
    session: SessionContext,
    State(service): State<Arc<CatalogService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Service>>> {
    let found = service.get_service(&session, id).await?;
    Ok(Json(ApiResponse::success(Some(found), None, None)))
}

/// List centers offering a service
#[utoipa::path(
    get,
    path = "/api/services/{id}/centers",
    params(
        ("id" = i64, Path, description = "Service ID")
    ),
    responses(
        (status = 200, description = "Centers offering the service", body = ApiResponse<Vec<Center>>),
    ),
    tag = "catalog"
)]
pub async fn list_centers(
    session: SessionContext,
    State(service): State<Arc<CatalogService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Center>>>> {
    let centers = service.list_centers(&session, id).await?;
    Ok(Json(ApiResponse::success(Some(centers), None, None)))
}
