//! Typed views of the backend's JSON entities.
//!
//! The backend is loose about optional fields and naming, so every struct here
//! defaults what may be missing and accepts the known aliases. Parsing happens
//! once, in the client; the rest of the crate only sees these types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

fn default_true() -> bool {
    true
}

/// Identifiers the backend sends either as numbers or strings
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

/// Deserialize `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// SERVICES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Fee {
    #[serde(rename = "type")]
    pub fee_type: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RequiredDocument {
    pub name: String,
    /// Other documents accepted in place of this one
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Service {
    #[serde(alias = "service_id")]
    pub id: i64,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub processing_time: Option<String>,
    #[serde(default, alias = "fee_schedule", deserialize_with = "null_as_default")]
    pub fees: Vec<Fee>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required_documents: Vec<RequiredDocument>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServiceCategory {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "category")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub service_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServiceDetail {
    pub id: i64,
    pub service_id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// CENTERS & COUNTERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OperatingHours {
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Center {
    #[serde(alias = "center_id")]
    pub id: i64,
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
    pub email: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Keyed by lowercase weekday name
    #[serde(default, deserialize_with = "null_as_default")]
    pub operating_hours: BTreeMap<String, OperatingHours>,
    #[serde(default, alias = "service_ids", deserialize_with = "null_as_default")]
    pub services: Vec<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub counter_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Counter {
    pub id: i64,
    pub center_id: i64,
    pub name: String,
    #[serde(default, alias = "services", deserialize_with = "null_as_default")]
    pub service_ids: Vec<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// TIME SLOTS & AVAILABILITY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimeSlot {
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Time slot to be created by a bulk request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewTimeSlot {
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    pub is_active: bool,
}

/// A date on which a center has capacity for a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AvailableDate {
    pub date: NaiveDate,
    #[serde(default, alias = "availableSlots")]
    pub available_slots: Option<i64>,
}

/// A slot on a specific date with its remaining capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AvailableSlot {
    #[serde(alias = "slot_id", alias = "slotId")]
    pub id: i64,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
    #[serde(default, alias = "availableCount", alias = "available_count")]
    pub available: i64,
}

impl AvailableSlot {
    pub fn is_bookable(&self) -> bool {
        self.available > 0
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

// =============================================================================
// APPOINTMENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    #[serde(alias = "no-show")]
    NoShow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    #[serde(alias = "appointment_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub service_id: Option<i64>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub center_id: Option<i64>,
    #[serde(default)]
    pub center_name: Option<String>,
    #[serde(default)]
    pub counter_id: Option<i64>,
    #[serde(default)]
    pub slot_id: Option<i64>,
    #[serde(default, alias = "date")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default = "default_appointment_status")]
    pub status: AppointmentStatus,
}

fn default_appointment_status() -> AppointmentStatus {
    AppointmentStatus::Scheduled
}

// =============================================================================
// APPLICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    #[serde(alias = "in-progress")]
    InProgress,
    Approved,
    Rejected,
    Completed,
}

/// Free-form applicant snapshot stored alongside an application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicantInfo {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

/// `applicant_info` arrives either as an object or as a JSON-encoded string.
/// It is parsed exactly once; garbage is kept rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplicantInfoField {
    Parsed(ApplicantInfo),
    Unparseable {
        raw: String,
        error: String,
    },
    #[default]
    Absent,
}

impl ApplicantInfoField {
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ApplicantInfoField::Absent,
            serde_json::Value::String(raw) if raw.trim().is_empty() => ApplicantInfoField::Absent,
            serde_json::Value::String(raw) => match serde_json::from_str::<ApplicantInfo>(&raw) {
                Ok(info) => ApplicantInfoField::Parsed(info),
                Err(e) => ApplicantInfoField::Unparseable {
                    raw,
                    error: e.to_string(),
                },
            },
            other => {
                let raw = other.to_string();
                match serde_json::from_value::<ApplicantInfo>(other) {
                    Ok(info) => ApplicantInfoField::Parsed(info),
                    Err(e) => ApplicantInfoField::Unparseable {
                        raw,
                        error: e.to_string(),
                    },
                }
            }
        }
    }

    pub fn parsed(&self) -> Option<&ApplicantInfo> {
        match self {
            ApplicantInfoField::Parsed(info) => Some(info),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ApplicantInfoField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(ApplicantInfoField::from_value(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(from = "StoredApplicationFile")]
pub struct ApplicationFile {
    pub id: i64,
    pub application_id: Option<i64>,
    pub original_filename: String,
    pub document_type: Option<String>,
    pub file_size: Option<i64>,
    pub uploaded_by: Option<i64>,
    /// Attached by an administrator rather than the applicant
    pub is_admin_upload: bool,
}

/// Backend shape of an application file
#[derive(Deserialize)]
struct StoredApplicationFile {
    id: i64,
    #[serde(default)]
    application_id: Option<i64>,
    #[serde(alias = "filename")]
    original_filename: String,
    #[serde(default)]
    document_type: Option<String>,
    #[serde(default)]
    file_size: Option<i64>,
    /// `None` means the file was attached by an administrator
    #[serde(default)]
    uploaded_by: Option<i64>,
}

impl From<StoredApplicationFile> for ApplicationFile {
    fn from(file: StoredApplicationFile) -> Self {
        Self {
            id: file.id,
            application_id: file.application_id,
            original_filename: file.original_filename,
            document_type: file.document_type,
            file_size: file.file_size,
            is_admin_upload: file.uploaded_by.is_none(),
            uploaded_by: file.uploaded_by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Application {
    #[serde(alias = "application_id")]
    pub id: i64,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub service_id: Option<i64>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub mother_name: Option<String>,
    #[serde(default)]
    pub spouse_name: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub passport_issue_date: Option<String>,
    #[serde(default)]
    pub passport_expiry_date: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Account that submitted the form
    #[serde(default)]
    pub submitted_by: Option<i64>,
    /// True when the submitter applied on behalf of someone else
    #[serde(default)]
    pub on_behalf_of: bool,
    #[serde(default)]
    pub applicant_info: ApplicantInfoField,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<ApplicationFile>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Public tracking view of a miscellaneous application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationTracking {
    #[serde(alias = "application_id")]
    pub id: i64,
    #[serde(default)]
    pub reference_number: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationTemplate {
    pub id: i64,
    pub key: String,
    pub subject: String,
    pub body: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// =============================================================================
// USERS & BOOKING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub passport_expiry: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

/// Applicant details sent with a booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub nationality: String,
    pub passport_number: String,
    pub passport_expiry: String,
    pub phone: String,
    pub email: String,
}

/// Body of `POST /booking/create`
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub service_id: i64,
    pub center_id: i64,
    pub date: NaiveDate,
    pub slot_id: i64,
    pub user_details: UserDetails,
}

/// Successful booking payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    #[serde(alias = "appointment_id", deserialize_with = "string_or_number")]
    pub appointment_id: String,
    #[serde(default)]
    pub confirmation: Option<String>,
    #[serde(default)]
    pub appointment: Option<Appointment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_accepts_name_alias_and_null_lists() {
        let service: Service = serde_json::from_value(json!({
            "service_id": 1,
            "name": "Passport Renewal",
            "fees": null,
            "required_documents": [
                {"name": "Old passport", "alternatives": ["Police report"], "note": "Original"}
            ]
        }))
        .unwrap();

        assert_eq!(service.id, 1);
        assert_eq!(service.title, "Passport Renewal");
        assert!(service.fees.is_empty());
        assert!(service.is_active);
        assert_eq!(service.required_documents[0].alternatives, vec!["Police report"]);
    }

    #[test]
    fn test_applicant_info_from_encoded_string() {
        let field = ApplicantInfoField::from_value(json!(
            "{\"first_name\":\"Ada\",\"nationality\":\"Kenyan\"}"
        ));
        let info = field.parsed().expect("should parse");
        assert_eq!(info.first_name.as_deref(), Some("Ada"));
        assert_eq!(info.nationality.as_deref(), Some("Kenyan"));
    }

    #[test]
    fn test_applicant_info_from_object() {
        let field = ApplicantInfoField::from_value(json!({"first_name": "Ada"}));
        assert!(field.parsed().is_some());
    }

    #[test]
    fn test_applicant_info_garbage_is_kept() {
        let field = ApplicantInfoField::from_value(json!("{not json"));
        match field {
            ApplicantInfoField::Unparseable { raw, .. } => assert_eq!(raw, "{not json"),
            other => panic!("expected unparseable, got {:?}", other),
        }
    }

    #[test]
    fn test_applicant_info_missing_or_empty_is_absent() {
        let app: Application = serde_json::from_value(json!({
            "id": 7,
            "status": "in-progress"
        }))
        .unwrap();
        assert_eq!(app.applicant_info, ApplicantInfoField::Absent);
        assert_eq!(app.status, ApplicationStatus::InProgress);
        assert_eq!(
            ApplicantInfoField::from_value(json!("  ")),
            ApplicantInfoField::Absent
        );
    }

    #[test]
    fn test_appointment_status_accepts_hyphenated_no_show() {
        let status: AppointmentStatus = serde_json::from_value(json!("no-show")).unwrap();
        assert_eq!(status, AppointmentStatus::NoShow);
        assert_eq!(serde_json::to_value(status).unwrap(), json!("no_show"));
    }

    #[test]
    fn test_admin_added_file_has_no_uploader() {
        let file: ApplicationFile = serde_json::from_value(json!({
            "id": 3,
            "filename": "notes.pdf",
            "uploaded_by": null
        }))
        .unwrap();
        assert!(file.is_admin_upload);
    }

    #[test]
    fn test_booking_confirmation_accepts_numeric_id() {
        let confirmation: BookingConfirmation = serde_json::from_value(json!({
            "appointmentId": 1042,
            "confirmation": "APT-1042"
        }))
        .unwrap();
        assert_eq!(confirmation.appointment_id, "1042");
        assert!(confirmation.appointment.is_none());
    }

    #[test]
    fn test_booking_request_uses_camel_case_contract() {
        let request = BookingRequest {
            service_id: 1,
            center_id: 5,
            date: NaiveDate::from_ymd_opt(2025, 12, 30).unwrap(),
            slot_id: 9,
            user_details: UserDetails::default(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["serviceId"], 1);
        assert_eq!(value["centerId"], 5);
        assert_eq!(value["date"], "2025-12-30");
        assert_eq!(value["slotId"], 9);
        assert!(value["userDetails"].is_object());
    }
}
