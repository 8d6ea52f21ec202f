use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

use crate::core::error::Result;
use crate::modules::backend::client::BackendSession;
use crate::modules::backend::models::{NewTimeSlot, TimeSlot};

#[derive(Debug, Serialize)]
struct BulkToggleRequest<'a> {
    ids: &'a [i64],
    is_active: bool,
}

impl BackendSession {
    pub async fn bulk_create_time_slots(&self, slots: &[NewTimeSlot]) -> Result<Vec<TimeSlot>> {
        tracing::info!("Bulk creating {} time slot(s)", slots.len());
        self.send(
            Method::POST,
            "/admin/time-slots/bulk-create",
            &json!({ "slots": slots }),
            Some("slots"),
            "time slots",
        )
        .await
    }

    /// Returns how many slots the backend reports as updated
    pub async fn bulk_toggle_time_slots(&self, ids: &[i64], is_active: bool) -> Result<i64> {
        let reply = self
            .call(
                Method::PATCH,
                "/admin/time-slots/bulk-toggle",
                Some(&BulkToggleRequest { ids, is_active }),
            )
            .await?;

        let updated = ["/updated", "/data/updated", "/count", "/data/count"]
            .iter()
            .find_map(|p| reply.body.pointer(p))
            .and_then(Value::as_i64)
            .unwrap_or(ids.len() as i64);
        Ok(updated)
    }
}
