use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::booking::wizard::{BookingWizard, FetchKind, WizardStep};
use crate::modules::backend::{
    AvailableDate, AvailableSlot, BookingConfirmation, Center, Service, UserDetails,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectServiceDto {
    #[serde(alias = "serviceId")]
    pub service_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectCenterDto {
    #[serde(alias = "centerId")]
    pub center_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectDateDto {
    /// Date in `YYYY-MM-DD` format
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectSlotDto {
    #[serde(alias = "slotId")]
    pub slot_id: i64,
}

/// Partial update of the applicant form; omitted fields are left unchanged
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ApplicantDetailsDto {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "dateOfBirth")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default, alias = "passportNumber")]
    pub passport_number: Option<String>,
    #[serde(default, alias = "passportExpiry")]
    pub passport_expiry: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ApplicantDetailsDto {
    pub fn apply_to(self, details: &mut UserDetails) {
        let fields = [
            (self.first_name, &mut details.first_name),
            (self.last_name, &mut details.last_name),
            (self.gender, &mut details.gender),
            (self.date_of_birth, &mut details.date_of_birth),
            (self.nationality, &mut details.nationality),
            (self.passport_number, &mut details.passport_number),
            (self.passport_expiry, &mut details.passport_expiry),
            (self.phone, &mut details.phone),
            (self.email, &mut details.email),
        ];
        for (value, target) in fields {
            if let Some(value) = value {
                *target = value.trim().to_string();
            }
        }
    }
}

/// Everything the front end needs to draw the current wizard step
#[derive(Debug, Serialize, ToSchema)]
pub struct WizardViewDto {
    /// Step number, 1-7
    pub step: u8,
    pub step_name: WizardStep,
    pub step_title: String,
    /// Whether `next` would be accepted right now
    pub can_advance: bool,
    /// What is still missing before `next` is accepted
    pub missing: Vec<String>,
    pub services: Vec<Service>,
    pub selected_service: Option<Service>,
    pub centers: Vec<Center>,
    pub selected_center: Option<Center>,
    pub applicant: UserDetails,
    pub applicant_count: u8,
    pub available_dates: Vec<AvailableDate>,
    pub selected_date: Option<NaiveDate>,
    pub available_slots: Vec<AvailableSlot>,
    pub selected_slot: Option<AvailableSlot>,
    pub booking: Option<BookingConfirmation>,
    /// Last failure to show the visitor
    pub alert: Option<String>,
    pub loading: Vec<FetchKind>,
    pub submitting: bool,
}

impl From<&BookingWizard> for WizardViewDto {
    fn from(wizard: &BookingWizard) -> Self {
        let step = wizard.step();
        let missing = wizard.missing_fields(step);
        Self {
            step: step.number(),
            step_name: step,
            step_title: step.title().to_string(),
            can_advance: wizard.can_advance(),
            missing,
            services: wizard.services().to_vec(),
            selected_service: wizard.selected_service().cloned(),
            centers: wizard.centers().to_vec(),
            selected_center: wizard.selected_center().cloned(),
            applicant: wizard.applicant().clone(),
            applicant_count: wizard.applicant_count(),
            available_dates: wizard.available_dates().to_vec(),
            selected_date: wizard.date(),
            available_slots: wizard.available_slots().to_vec(),
            selected_slot: wizard.selected_slot().cloned(),
            booking: wizard.booking().cloned(),
            alert: wizard.alert().map(str::to_string),
            loading: wizard.loading(),
            submitting: wizard.is_submitting(),
        }
    }
}
