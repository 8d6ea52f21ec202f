use crate::core::error::{AppError, Result};
use crate::features::auth::model::SessionContext;
use crate::features::catalog::dtos::ListServicesQuery;
use crate::modules::backend::{BackendClient, BookingBackend, Center, Service, ServiceCategory};

/// Service discovery over the backend catalog
pub struct CatalogService {
    client: BackendClient,
}

impl CatalogService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// List active services matching the query
    pub async fn list_services(
        &self,
        session: &SessionContext,
        query: &ListServicesQuery,
    ) -> Result<Vec<Service>> {
        let services = self
            .client
            .session(session.credentials.clone())
            .list_services()
            .await?;

        Ok(services.into_iter().filter(|s| query.matches(s)).collect())
    }

    pub async fn list_categories(&self, session: &SessionContext) -> Result<Vec<ServiceCategory>> {
        self.client
            .session(session.credentials.clone())
            .list_categories()
            .await
    }

    pub async fn get_service(&self, session: &SessionContext, service_id: i64) -> Result<Service> {
        let service = self
            .client
            .session(session.credentials.clone())
            .get_service(service_id)
            .await
            .map_err(|e| match e {
                AppError::Backend { status: 404, .. } => {
                    AppError::NotFound(format!("Service {} not found", service_id))
                }
                other => other,
            })?;

        if !service.is_active {
            return Err(AppError::NotFound(format!(
                "Service {} not found",
                service_id
            )));
        }

        Ok(service)
    }

    /// Active centers offering a service
    pub async fn list_centers(
        &self,
        session: &SessionContext,
        service_id: i64,
    ) -> Result<Vec<Center>> {
        let centers = self
            .client
            .session(session.credentials.clone())
            .list_centers(service_id)
            .await?;

        Ok(centers.into_iter().filter(|c| c.is_active).collect())
    }
}
