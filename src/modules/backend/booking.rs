use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;

use crate::core::error::Result;
use crate::modules::backend::client::BackendSession;
use crate::modules::backend::models::{
    AvailableDate, AvailableSlot, BookingConfirmation, BookingRequest, Center, Service,
    ServiceCategory, UserProfile,
};

/// Backend calls the booking wizard and the chat assistant depend on.
///
/// Implemented by [`BackendSession`]; tests substitute an in-memory catalog.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>>;

    async fn list_centers(&self, service_id: i64) -> Result<Vec<Center>>;

    async fn available_dates(&self, center_id: i64, service_id: i64)
        -> Result<Vec<AvailableDate>>;

    async fn available_slots(
        &self,
        center_id: i64,
        service_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AvailableSlot>>;

    /// Profile of the logged-in visitor, `None` when anonymous
    async fn current_user(&self) -> Result<Option<UserProfile>>;

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation>;
}

impl BackendSession {
    pub async fn list_categories(&self) -> Result<Vec<ServiceCategory>> {
        self.get("/services/categories", &[], Some("categories"), "categories")
            .await
    }

    pub async fn get_service(&self, service_id: i64) -> Result<Service> {
        self.get(
            &format!("/services/{}", service_id),
            &[],
            Some("service"),
            "service",
        )
        .await
    }

    pub async fn fetch_me(&self) -> Result<UserProfile> {
        self.get("/auth/me", &[], Some("user"), "user").await
    }
}

#[async_trait]
impl BookingBackend for BackendSession {
    async fn list_services(&self) -> Result<Vec<Service>> {
        self.get("/booking/services", &[], Some("services"), "services")
            .await
    }

    async fn list_centers(&self, service_id: i64) -> Result<Vec<Center>> {
        self.get(
            &format!("/booking/centers/{}", service_id),
            &[],
            Some("centers"),
            "centers",
        )
        .await
    }

    async fn available_dates(
        &self,
        center_id: i64,
        service_id: i64,
    ) -> Result<Vec<AvailableDate>> {
        self.get(
            "/booking/available-dates",
            &[
                ("centerId", center_id.to_string()),
                ("serviceId", service_id.to_string()),
            ],
            Some("dates"),
            "available dates",
        )
        .await
    }

    async fn available_slots(
        &self,
        center_id: i64,
        service_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AvailableSlot>> {
        self.get(
            "/booking/available-slots",
            &[
                ("centerId", center_id.to_string()),
                ("serviceId", service_id.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ],
            Some("slots"),
            "available slots",
        )
        .await
    }

    async fn current_user(&self) -> Result<Option<UserProfile>> {
        if self.credentials().is_empty() {
            return Ok(None);
        }
        self.fetch_me().await.map(Some)
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        tracing::info!(
            "Creating booking: service={} center={} date={} slot={}",
            request.service_id,
            request.center_id,
            request.date,
            request.slot_id
        );
        self.send(Method::POST, "/booking/create", request, None, "booking")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{backend_client, spawn_mock_backend};
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_available_slots_sends_query_and_parses_aliases() {
        let router = Router::new().route(
            "/booking/available-slots",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("centerId").map(String::as_str), Some("5"));
                assert_eq!(q.get("serviceId").map(String::as_str), Some("1"));
                assert_eq!(q.get("date").map(String::as_str), Some("2025-12-30"));
                Json(json!({
                    "success": true,
                    "data": {"slots": [
                        {"slot_id": 11, "startTime": "09:00", "endTime": "09:30", "availableCount": 2}
                    ]}
                }))
            }),
        );
        let client = backend_client(spawn_mock_backend(router).await);

        let slots = client
            .anonymous()
            .available_slots(5, 1, NaiveDate::from_ymd_opt(2025, 12, 30).unwrap())
            .await
            .unwrap();

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].id, 11);
        assert!(slots[0].is_bookable());
    }

    #[tokio::test]
    async fn test_anonymous_current_user_skips_backend() {
        // No route is mounted: any request would fail
        let client = backend_client(spawn_mock_backend(Router::new()).await);
        let user = client.anonymous().current_user().await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_create_booking_reads_top_level_fields() {
        let router = Router::new().route(
            "/booking/create",
            axum::routing::post(|Json(body): Json<Value>| async move {
                assert_eq!(body["serviceId"], 1);
                Json(json!({"success": true, "appointmentId": "APT-77", "confirmation": "OK"}))
            }),
        );
        let client = backend_client(spawn_mock_backend(router).await);

        let request = BookingRequest {
            service_id: 1,
            center_id: 5,
            date: NaiveDate::from_ymd_opt(2025, 12, 30).unwrap(),
            slot_id: 11,
            user_details: Default::default(),
        };
        let confirmation = client.anonymous().create_booking(&request).await.unwrap();
        assert_eq!(confirmation.appointment_id, "APT-77");
        assert_eq!(confirmation.confirmation.as_deref(), Some("OK"));
    }
}
