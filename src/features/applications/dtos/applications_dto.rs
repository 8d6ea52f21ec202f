use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::modules::backend::ApplicantInfo;
use crate::shared::upload::UploadForm;
use crate::shared::validation::{EMAIL_REGEX, PHONE_REGEX};

/// Miscellaneous application form as read from the multipart body.
///
/// The top-level person fields describe the account holder submitting the
/// form. When `on_behalf_of` is set, the person the application is for is
/// carried in `applicant` and forwarded as the `applicant_info` JSON field.
#[derive(Debug, Default, Serialize, Validate)]
#[validate(schema(function = "validate_on_behalf_of"))]
pub struct MiscellaneousApplicationForm {
    #[validate(length(min = 1, message = "Please choose the type of service you need"))]
    pub service_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<i64>,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(regex(path = *EMAIL_REGEX, message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Please enter a valid phone number"))]
    pub phone: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spouse_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_issue_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub on_behalf_of: bool,

    #[serde(skip)]
    pub applicant: ApplicantInfo,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

fn validate_on_behalf_of(form: &MiscellaneousApplicationForm) -> Result<(), ValidationError> {
    if !form.on_behalf_of {
        return Ok(());
    }

    let applicant = &form.applicant;
    if is_blank(&applicant.first_name) || is_blank(&applicant.last_name) {
        return Err(ValidationError::new("applicant_name_required").with_message(
            "The applicant's first and last name are required when applying for someone else"
                .into(),
        ));
    }

    if is_blank(&applicant.relationship) {
        return Err(ValidationError::new("relationship_required")
            .with_message("Please state your relationship to the applicant".into()));
    }

    if applicant
        .email
        .as_deref()
        .is_some_and(|email| !EMAIL_REGEX.is_match(email))
    {
        return Err(ValidationError::new("applicant_email_invalid")
            .with_message("Please enter a valid email address for the applicant".into()));
    }

    Ok(())
}

impl MiscellaneousApplicationForm {
    pub fn from_upload(form: &UploadForm) -> Self {
        let text = |name: &str| form.text(name).unwrap_or_default();
        let on_behalf_of = form.flag("on_behalf_of");

        let applicant = if on_behalf_of {
            ApplicantInfo {
                first_name: form.text("applicant_first_name"),
                last_name: form.text("applicant_last_name"),
                date_of_birth: form.text("applicant_date_of_birth"),
                nationality: form.text("applicant_nationality"),
                passport_number: form.text("applicant_passport_number"),
                email: form.text("applicant_email"),
                phone: form.text("applicant_phone"),
                relationship: form.text("relationship"),
            }
        } else {
            ApplicantInfo::default()
        };

        Self {
            service_type: text("service_type"),
            service_id: form.text("service_id").and_then(|v| v.parse().ok()),
            first_name: text("first_name"),
            last_name: text("last_name"),
            email: text("email"),
            phone: text("phone"),
            date_of_birth: form.text("date_of_birth"),
            place_of_birth: form.text("place_of_birth"),
            nationality: form.text("nationality"),
            father_name: form.text("father_name"),
            mother_name: form.text("mother_name"),
            spouse_name: form.text("spouse_name"),
            passport_number: form.text("passport_number"),
            passport_issue_date: form.text("passport_issue_date"),
            passport_expiry_date: form.text("passport_expiry_date"),
            description: form.text("description"),
            on_behalf_of,
            applicant,
        }
    }

    /// Text parts for the backend's multipart form
    pub fn into_backend_fields(self) -> Vec<(String, String)> {
        let applicant_info = self
            .on_behalf_of
            .then(|| serde_json::to_string(&self.applicant).ok())
            .flatten();

        let mut fields: Vec<(String, String)> = match serde_json::to_value(&self) {
            Ok(Value::Object(map)) => map
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) => Some((key, s)),
                    Value::Null => None,
                    other => Some((key, other.to_string())),
                })
                .collect(),
            _ => Vec::new(),
        };

        if let Some(info) = applicant_info {
            fields.push(("applicant_info".to_string(), info));
        }
        fields
    }
}

/// Multipart body of `POST /api/applications/miscellaneous`, for the API docs.
/// The handler reads the form with axum's `Multipart` extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct MiscellaneousApplicationUpload {
    #[schema(example = "Power of attorney attestation")]
    pub service_type: String,
    pub service_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub description: Option<String>,
    /// "true" when applying for someone else
    pub on_behalf_of: Option<bool>,
    /// Required when `on_behalf_of` is set
    pub relationship: Option<String>,
    pub applicant_first_name: Option<String>,
    pub applicant_last_name: Option<String>,
    /// Any number of file parts; the part name is kept as the document type
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub documents: Option<String>,
}

/// Multipart body carrying one passport scan, for the API docs
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct PassportScanUpload {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub passport: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;

    fn upload(pairs: &[(&str, &str)]) -> UploadForm {
        let mut form = UploadForm::default();
        for (key, value) in pairs {
            form.fields.insert(key.to_string(), value.to_string());
        }
        form
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("service_type", "Document attestation"),
            ("first_name", "Ada"),
            ("last_name", "Lovelace"),
            ("email", "a@b.com"),
            ("phone", "+44 20 7946 0000"),
        ]
    }

    #[test]
    fn test_minimal_form_is_valid() {
        let form = MiscellaneousApplicationForm::from_upload(&upload(&base()));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_invalid_email_is_reported() {
        let mut pairs = base();
        pairs[3] = ("email", "a@b");
        let form = MiscellaneousApplicationForm::from_upload(&upload(&pairs));
        let err = AppError::from(form.validate().unwrap_err());
        assert_eq!(err.user_message(), "Please enter a valid email address");
    }

    #[test]
    fn test_on_behalf_of_requires_relationship() {
        let mut pairs = base();
        pairs.extend([
            ("on_behalf_of", "true"),
            ("applicant_first_name", "Byron"),
            ("applicant_last_name", "Lovelace"),
        ]);
        let form = MiscellaneousApplicationForm::from_upload(&upload(&pairs));
        let err = AppError::from(form.validate().unwrap_err());
        assert_eq!(
            err.user_message(),
            "Please state your relationship to the applicant"
        );

        pairs.push(("relationship", "Child"));
        let form = MiscellaneousApplicationForm::from_upload(&upload(&pairs));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_backend_fields_pack_applicant_info() {
        let mut pairs = base();
        pairs.extend([
            ("on_behalf_of", "on"),
            ("applicant_first_name", "Byron"),
            ("applicant_last_name", "Lovelace"),
            ("relationship", "Child"),
        ]);
        let fields = MiscellaneousApplicationForm::from_upload(&upload(&pairs))
            .into_backend_fields();

        let get = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("on_behalf_of").as_deref(), Some("true"));
        assert_eq!(get("nationality"), None);

        let info: ApplicantInfo = serde_json::from_str(&get("applicant_info").unwrap()).unwrap();
        assert_eq!(info.first_name.as_deref(), Some("Byron"));
        assert_eq!(info.relationship.as_deref(), Some("Child"));
    }
}
