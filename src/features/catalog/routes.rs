use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::catalog::handlers;
use crate::features::catalog::services::CatalogService;

/// Public service-discovery routes
pub fn routes(service: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/api/services", get(handlers::list_services))
        .route("/api/services/categories", get(handlers::list_categories))
        .route("/api/services/{id}", get(handlers::get_service))
        .route("/api/services/{id}/centers", get(handlers::list_centers))
        .with_state(service)
}
