use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::modules::backend::{
    ApplicationStatus, AppointmentStatus, Fee, OperatingHours, RequiredDocument, TimeSlot,
};
use crate::shared::types::PaginationQuery;
use crate::shared::validation::{EMAIL_REGEX, TEMPLATE_KEY_REGEX, TIME_OF_DAY_REGEX};

// =============================================================================
// LISTING
// =============================================================================

/// Filters every admin table accepts; unknown filters are ignored by the backend
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AdminListQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub service_id: Option<i64>,
    #[serde(default)]
    pub center_id: Option<i64>,
}

impl AdminListQuery {
    /// Query string for the backend, with pagination clamped
    pub fn backend_params(&self) -> Vec<(&'static str, String)> {
        let mut pagination = PaginationQuery::default();
        if let Some(page) = self.page {
            pagination.page = page;
        }
        if let Some(size) = self.page_size {
            pagination.page_size = size;
        }

        let mut params = vec![
            ("page", pagination.page().to_string()),
            ("limit", pagination.limit().to_string()),
        ];
        let filters = [
            ("search", self.search.clone()),
            ("status", self.status.clone()),
            ("service_id", self.service_id.map(|v| v.to_string())),
            ("center_id", self.center_id.map(|v| v.to_string())),
        ];
        params.extend(
            filters
                .into_iter()
                .filter_map(|(k, v)| v.filter(|v| !v.trim().is_empty()).map(|v| (k, v))),
        );
        params
    }
}

/// Payload type for operations a resource does not offer
#[derive(Debug, Serialize, Deserialize)]
pub enum Unsupported {}

impl Validate for Unsupported {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match *self {}
    }
}

// =============================================================================
// CATALOG
// =============================================================================

fn validate_fees(fees: &[Fee]) -> Result<(), ValidationError> {
    if fees.iter().any(|f| f.amount < 0.0 || f.fee_type.trim().is_empty()) {
        return Err(ValidationError::new("invalid_fee")
            .with_message("Every fee needs a type and a non-negative amount".into()));
    }
    Ok(())
}

fn validate_documents(documents: &[RequiredDocument]) -> Result<(), ValidationError> {
    if documents.iter().any(|d| d.name.trim().is_empty()) {
        return Err(ValidationError::new("invalid_document")
            .with_message("Every required document needs a name".into()));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServiceInput {
    #[validate(length(min = 1, max = 200, message = "Service title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub processing_time: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_fees"))]
    pub fees: Vec<Fee>,
    #[serde(default)]
    #[validate(custom(function = "validate_documents"))]
    pub required_documents: Vec<RequiredDocument>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServiceDetailInput {
    #[validate(range(min = 1, message = "Choose the service this detail belongs to"))]
    pub service_id: i64,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// CENTERS & COUNTERS
// =============================================================================

fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::new("email").with_message("Invalid email format".into()));
    }
    Ok(())
}

fn validate_operating_hours(hours: &BTreeMap<String, OperatingHours>) -> Result<(), ValidationError> {
    for (day, h) in hours {
        if h.closed {
            continue;
        }
        let valid = |t: &Option<String>| t.as_deref().is_some_and(|t| TIME_OF_DAY_REGEX.is_match(t));
        if !valid(&h.open) || !valid(&h.close) {
            return Err(ValidationError::new("operating_hours").with_message(
                format!("Opening hours for {} must be HH:MM or marked closed", day).into(),
            ));
        }
        if h.open >= h.close {
            return Err(ValidationError::new("operating_hours")
                .with_message(format!("{} closes before it opens", day).into()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CenterInput {
    #[validate(length(min = 1, max = 200, message = "Center name is required"))]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[serde(default)]
    #[validate(custom(function = "validate_operating_hours"))]
    pub operating_hours: BTreeMap<String, OperatingHours>,
    #[serde(default)]
    pub services: Vec<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CounterInput {
    #[validate(range(min = 1, message = "Choose the center this counter belongs to"))]
    pub center_id: i64,
    #[validate(length(min = 1, max = 100, message = "Counter name is required"))]
    pub name: String,
    #[serde(default)]
    pub service_ids: Vec<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// TIME SLOTS
// =============================================================================

fn validate_slot_order(input: &TimeSlotInput) -> Result<(), ValidationError> {
    // "HH:MM" strings order the same way the times do
    if input.end_time <= input.start_time {
        return Err(ValidationError::new("slot_order")
            .with_message("End time must be after start time".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_slot_order"))]
pub struct TimeSlotInput {
    #[validate(regex(path = *TIME_OF_DAY_REGEX, message = "Start time must be HH:MM"))]
    #[schema(example = "09:00")]
    pub start_time: String,
    #[validate(regex(path = *TIME_OF_DAY_REGEX, message = "End time must be HH:MM"))]
    #[schema(example = "09:30")]
    pub end_time: String,
    #[serde(default)]
    #[validate(range(min = 5, max = 480, message = "Duration must be between 5 and 480 minutes"))]
    pub duration_minutes: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Generate back-to-back slots covering `[start_time, end_time)`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkCreateSlotsDto {
    #[validate(regex(path = *TIME_OF_DAY_REGEX, message = "Start time must be HH:MM"))]
    #[schema(example = "09:00")]
    pub start_time: String,
    #[validate(regex(path = *TIME_OF_DAY_REGEX, message = "End time must be HH:MM"))]
    #[schema(example = "12:00")]
    pub end_time: String,
    #[validate(range(min = 5, max = 480, message = "Duration must be between 5 and 480 minutes"))]
    #[schema(example = 30)]
    pub duration_minutes: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkToggleSlotsDto {
    #[validate(length(min = 1, message = "Select at least one time slot"))]
    pub ids: Vec<i64>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCreateSlotsResponseDto {
    pub created: usize,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkToggleSlotsResponseDto {
    pub updated: i64,
}

// =============================================================================
// APPLICATIONS & APPOINTMENTS
// =============================================================================

fn validate_rejection_notes(update: &ApplicationStatusUpdate) -> Result<(), ValidationError> {
    let has_notes = update
        .admin_notes
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty());

    if update.status == ApplicationStatus::Rejected && !has_notes {
        return Err(ValidationError::new("rejection_notes_required").with_message(
            "Admin notes are required when rejecting an application".into(),
        ));
    }
    Ok(())
}

/// Status change on a general or miscellaneous application.
///
/// A rejection must say why.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_rejection_notes"))]
pub struct ApplicationStatusUpdate {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AppointmentStatusUpdate {
    pub status: AppointmentStatus,
}

// =============================================================================
// NOTIFICATION TEMPLATES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NotificationTemplateInput {
    #[validate(regex(
        path = *TEMPLATE_KEY_REGEX,
        message = "Key must be lowercase letters, digits and underscores"
    ))]
    #[schema(example = "appointment_confirmed")]
    pub key: String,
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Render a notification template against sample values
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TemplatePreviewDto {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
    /// Variables available to the template
    #[serde(default)]
    #[schema(value_type = Object)]
    pub context: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplatePreviewResponseDto {
    pub subject: String,
    pub body: String,
    /// Variables used by the template but absent from the context
    pub missing_variables: Vec<String>,
}

/// Optional text part sent with an admin document upload
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct AttachFileUpload {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    #[schema(example = "approval_letter")]
    pub document_type: Option<String>,
}
