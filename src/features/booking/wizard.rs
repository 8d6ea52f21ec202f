//! Seven-step booking wizard.
//!
//! The wizard is a pure state machine: transitions return the fetches they
//! need as [`WizardEffect`]s and results come back through
//! [`BookingWizard::apply`]. Each effect carries the generation of its fetch
//! kind at the moment it was emitted. Any selection that makes a fetch
//! obsolete bumps that kind's generation, so a late response for an old
//! selection no longer matches and is dropped.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::features::booking::dtos::ApplicantDetailsDto;
use crate::modules::backend::{
    AvailableDate, AvailableSlot, BookingConfirmation, BookingRequest, Center, Service,
    UserDetails, UserProfile,
};
use crate::shared::constants::APPLICANTS_PER_BOOKING;
use crate::shared::validation::is_valid_email;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Category,
    Center,
    ApplicantDetails,
    ApplicantCount,
    DateTime,
    Review,
    Confirmation,
}

impl WizardStep {
    const ALL: [WizardStep; 7] = [
        WizardStep::Category,
        WizardStep::Center,
        WizardStep::ApplicantDetails,
        WizardStep::ApplicantCount,
        WizardStep::DateTime,
        WizardStep::Review,
        WizardStep::Confirmation,
    ];

    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Category => "Choose a service",
            WizardStep::Center => "Choose a center",
            WizardStep::ApplicantDetails => "Applicant details",
            WizardStep::ApplicantCount => "Number of applicants",
            WizardStep::DateTime => "Date and time",
            WizardStep::Review => "Review",
            WizardStep::Confirmation => "Confirmation",
        }
    }

    fn next(self) -> Option<Self> {
        Self::ALL.get(self.number() as usize).copied()
    }

    fn previous(self) -> Option<Self> {
        let index = self.number() as usize - 1;
        index.checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// Kinds of data the wizard loads from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Services,
    Centers,
    Dates,
    Slots,
    Profile,
}

#[derive(Debug, Clone, Copy, Default)]
struct Generations {
    services: u64,
    centers: u64,
    dates: u64,
    slots: u64,
    profile: u64,
    submission: u64,
}

impl Generations {
    fn slot(&mut self, kind: FetchKind) -> &mut u64 {
        match kind {
            FetchKind::Services => &mut self.services,
            FetchKind::Centers => &mut self.centers,
            FetchKind::Dates => &mut self.dates,
            FetchKind::Slots => &mut self.slots,
            FetchKind::Profile => &mut self.profile,
        }
    }

    fn get(&self, kind: FetchKind) -> u64 {
        match kind {
            FetchKind::Services => self.services,
            FetchKind::Centers => self.centers,
            FetchKind::Dates => self.dates,
            FetchKind::Slots => self.slots,
            FetchKind::Profile => self.profile,
        }
    }

    fn bump(&mut self, kind: FetchKind) -> u64 {
        let slot = self.slot(kind);
        *slot += 1;
        *slot
    }

    fn bump_all(&mut self) {
        for kind in [
            FetchKind::Services,
            FetchKind::Centers,
            FetchKind::Dates,
            FetchKind::Slots,
            FetchKind::Profile,
        ] {
            self.bump(kind);
        }
        self.submission += 1;
    }
}

/// A backend fetch requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEffect {
    FetchServices {
        generation: u64,
    },
    FetchCenters {
        service_id: i64,
        generation: u64,
    },
    FetchDates {
        center_id: i64,
        service_id: i64,
        generation: u64,
    },
    FetchSlots {
        center_id: i64,
        service_id: i64,
        date: NaiveDate,
        generation: u64,
    },
    PrefillProfile {
        generation: u64,
    },
}

impl WizardEffect {
    pub fn kind(&self) -> FetchKind {
        match self {
            WizardEffect::FetchServices { .. } => FetchKind::Services,
            WizardEffect::FetchCenters { .. } => FetchKind::Centers,
            WizardEffect::FetchDates { .. } => FetchKind::Dates,
            WizardEffect::FetchSlots { .. } => FetchKind::Slots,
            WizardEffect::PrefillProfile { .. } => FetchKind::Profile,
        }
    }
}

/// Fetch result, or the user-facing message of the failure
pub type Fetched<T> = std::result::Result<T, String>;

/// Result of running a [`WizardEffect`], tagged with the effect's generation
#[derive(Debug)]
pub enum FetchOutcome {
    Services {
        generation: u64,
        result: Fetched<Vec<Service>>,
    },
    Centers {
        generation: u64,
        result: Fetched<Vec<Center>>,
    },
    Dates {
        generation: u64,
        result: Fetched<Vec<AvailableDate>>,
    },
    Slots {
        generation: u64,
        result: Fetched<Vec<AvailableSlot>>,
    },
    Profile {
        generation: u64,
        result: Fetched<Option<UserProfile>>,
    },
}

impl FetchOutcome {
    fn tag(&self) -> (FetchKind, u64) {
        match self {
            FetchOutcome::Services { generation, .. } => (FetchKind::Services, *generation),
            FetchOutcome::Centers { generation, .. } => (FetchKind::Centers, *generation),
            FetchOutcome::Dates { generation, .. } => (FetchKind::Dates, *generation),
            FetchOutcome::Slots { generation, .. } => (FetchKind::Slots, *generation),
            FetchOutcome::Profile { generation, .. } => (FetchKind::Profile, *generation),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: WizardStep,
    services: Vec<Service>,
    service_id: Option<i64>,
    centers: Vec<Center>,
    center_id: Option<i64>,
    applicant: UserDetails,
    applicant_count: u8,
    available_dates: Vec<AvailableDate>,
    date: Option<NaiveDate>,
    available_slots: Vec<AvailableSlot>,
    slot_id: Option<i64>,
    booking: Option<BookingConfirmation>,
    alert: Option<String>,
    loading: BTreeSet<FetchKind>,
    submitting: bool,
    generations: Generations,
}

impl BookingWizard {
    fn blank(generations: Generations) -> Self {
        Self {
            step: WizardStep::Category,
            services: Vec::new(),
            service_id: None,
            centers: Vec::new(),
            center_id: None,
            applicant: UserDetails::default(),
            applicant_count: APPLICANTS_PER_BOOKING,
            available_dates: Vec::new(),
            date: None,
            available_slots: Vec::new(),
            slot_id: None,
            booking: None,
            alert: None,
            loading: BTreeSet::new(),
            submitting: false,
            generations,
        }
    }

    /// A fresh wizard on step 1, plus the service list fetch
    pub fn start() -> (Self, Vec<WizardEffect>) {
        let mut wizard = Self::blank(Generations::default());
        let effects = wizard.emit(FetchKind::Services).into_iter().collect();
        (wizard, effects)
    }

    /// Back to step 1 with nothing selected ("book another").
    ///
    /// Every generation moves on, so nothing still in flight for the old
    /// booking can land in the new one.
    pub fn reset(&mut self) -> Vec<WizardEffect> {
        let mut generations = self.generations;
        generations.bump_all();
        *self = Self::blank(generations);
        self.emit(FetchKind::Services).into_iter().collect()
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn selected_service(&self) -> Option<&Service> {
        let id = self.service_id?;
        self.services.iter().find(|s| s.id == id)
    }

    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    pub fn selected_center(&self) -> Option<&Center> {
        let id = self.center_id?;
        self.centers.iter().find(|c| c.id == id)
    }

    pub fn applicant(&self) -> &UserDetails {
        &self.applicant
    }

    pub fn applicant_count(&self) -> u8 {
        self.applicant_count
    }

    pub fn available_dates(&self) -> &[AvailableDate] {
        &self.available_dates
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn available_slots(&self) -> &[AvailableSlot] {
        &self.available_slots
    }

    pub fn selected_slot(&self) -> Option<&AvailableSlot> {
        let id = self.slot_id?;
        self.available_slots.iter().find(|s| s.id == id)
    }

    pub fn booking(&self) -> Option<&BookingConfirmation> {
        self.booking.as_ref()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn loading(&self) -> Vec<FetchKind> {
        self.loading.iter().copied().collect()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    // ---------------------------------------------------------------------
    // Selections
    // ---------------------------------------------------------------------

    fn require_step(&self, step: WizardStep, what: &str) -> Result<()> {
        if self.step != step {
            return Err(AppError::BadRequest(format!(
                "{} can only be changed on step {} ({})",
                what,
                step.number(),
                step.title()
            )));
        }
        Ok(())
    }

    pub fn select_service(&mut self, service_id: i64) -> Result<()> {
        self.require_step(WizardStep::Category, "The service")?;

        if !self.services.iter().any(|s| s.id == service_id) {
            return Err(AppError::validation(format!(
                "Service {} is not available for booking",
                service_id
            )));
        }

        if self.service_id != Some(service_id) {
            self.service_id = Some(service_id);
            self.centers.clear();
            self.invalidate(FetchKind::Centers);
            self.clear_center();
        }
        self.alert = None;
        Ok(())
    }

    pub fn select_center(&mut self, center_id: i64) -> Result<()> {
        self.require_step(WizardStep::Center, "The center")?;

        if !self.centers.iter().any(|c| c.id == center_id) {
            return Err(AppError::validation(format!(
                "Center {} does not offer this service",
                center_id
            )));
        }

        if self.center_id != Some(center_id) {
            self.center_id = Some(center_id);
            self.clear_schedule();
        }
        self.alert = None;
        Ok(())
    }

    pub fn update_applicant(&mut self, patch: ApplicantDetailsDto) -> Result<()> {
        self.require_step(WizardStep::ApplicantDetails, "Applicant details")?;
        patch.apply_to(&mut self.applicant);
        // Typing over the form wins over a profile prefill still in flight
        self.invalidate(FetchKind::Profile);
        Ok(())
    }

    /// Choose a date and load its slots. Re-choosing the same date reloads them.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<Vec<WizardEffect>> {
        self.require_step(WizardStep::DateTime, "The date")?;

        if !self.available_dates.iter().any(|d| d.date == date) {
            return Err(AppError::validation(format!(
                "{} is not an available date",
                date.format("%Y-%m-%d")
            )));
        }

        self.date = Some(date);
        self.slot_id = None;
        self.available_slots.clear();
        self.invalidate(FetchKind::Slots);
        self.alert = None;

        Ok(self.emit(FetchKind::Slots).into_iter().collect())
    }

    pub fn select_slot(&mut self, slot_id: i64) -> Result<()> {
        self.require_step(WizardStep::DateTime, "The time slot")?;

        if self.date.is_none() {
            return Err(AppError::validation("Please select a date first"));
        }

        let bookable = self
            .available_slots
            .iter()
            .any(|s| s.id == slot_id && s.is_bookable());
        if !bookable {
            return Err(AppError::validation(
                "The selected time slot is no longer available",
            ));
        }

        self.slot_id = Some(slot_id);
        self.alert = None;
        Ok(())
    }

    fn clear_center(&mut self) {
        self.center_id = None;
        self.clear_schedule();
    }

    /// Dates and slots only make sense for the current service and center
    fn clear_schedule(&mut self) {
        self.available_dates.clear();
        self.date = None;
        self.available_slots.clear();
        self.slot_id = None;
        self.invalidate(FetchKind::Dates);
        self.invalidate(FetchKind::Slots);
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// What keeps `step` from being complete; empty when it may be left
    pub fn missing_fields(&self, step: WizardStep) -> Vec<String> {
        let mut missing = Vec::new();

        match step {
            WizardStep::Category => {
                if self.service_id.is_none() {
                    missing.push("Please select a service".to_string());
                }
            }
            WizardStep::Center => {
                if self.center_id.is_none() {
                    missing.push("Please select a center".to_string());
                }
            }
            WizardStep::ApplicantDetails => {
                let a = &self.applicant;
                let required = [
                    (&a.first_name, "First name"),
                    (&a.last_name, "Last name"),
                    (&a.gender, "Gender"),
                    (&a.date_of_birth, "Date of birth"),
                    (&a.nationality, "Nationality"),
                    (&a.passport_number, "Passport number"),
                    (&a.passport_expiry, "Passport expiry date"),
                    (&a.phone, "Phone number"),
                ];
                for (value, label) in required {
                    if value.trim().is_empty() {
                        missing.push(format!("{} is required", label));
                    }
                }
                if a.email.trim().is_empty() {
                    missing.push("Email is required".to_string());
                } else if !is_valid_email(&a.email) {
                    missing.push("Please enter a valid email address".to_string());
                }
            }
            WizardStep::ApplicantCount => {}
            WizardStep::DateTime => {
                if self.date.is_none() {
                    missing.push("Please select a date".to_string());
                }
                if self.slot_id.is_none() {
                    missing.push("Please select a time slot".to_string());
                }
            }
            WizardStep::Review | WizardStep::Confirmation => {}
        }

        missing
    }

    pub fn can_advance(&self) -> bool {
        !matches!(self.step, WizardStep::Review | WizardStep::Confirmation)
            && self.missing_fields(self.step).is_empty()
    }

    /// Move forward if the current step is complete. On failure the step is
    /// unchanged and the error lists what is missing.
    pub fn advance(&mut self) -> Result<Vec<WizardEffect>> {
        match self.step {
            WizardStep::Review => {
                return Err(AppError::BadRequest(
                    "Submit the booking to continue".to_string(),
                ))
            }
            WizardStep::Confirmation => {
                return Err(AppError::BadRequest(
                    "This booking is complete, start a new one to book again".to_string(),
                ))
            }
            _ => {}
        }

        let missing = self.missing_fields(self.step);
        if !missing.is_empty() {
            return Err(AppError::Validation(missing));
        }

        if let Some(next) = self.step.next() {
            self.step = next;
        }
        self.alert = None;
        Ok(self.enter_step())
    }

    /// Go back one step. Landing on the center or date step reloads its data.
    pub fn back(&mut self) -> Result<Vec<WizardEffect>> {
        if self.step == WizardStep::Confirmation {
            return Err(AppError::BadRequest(
                "This booking is complete, start a new one to book again".to_string(),
            ));
        }
        if self.submitting {
            return Err(AppError::Conflict(
                "The booking is being submitted".to_string(),
            ));
        }

        let previous = self
            .step
            .previous()
            .ok_or_else(|| AppError::BadRequest("Already at the first step".to_string()))?;

        self.step = previous;
        self.alert = None;
        Ok(self.enter_step())
    }

    fn enter_step(&mut self) -> Vec<WizardEffect> {
        let mut effects = Vec::new();
        match self.step {
            WizardStep::Center => effects.extend(self.emit(FetchKind::Centers)),
            WizardStep::ApplicantDetails if self.applicant.first_name.trim().is_empty() => {
                effects.extend(self.emit(FetchKind::Profile));
            }
            WizardStep::DateTime => {
                effects.extend(self.emit(FetchKind::Dates));
                effects.extend(self.emit(FetchKind::Slots));
            }
            _ => {}
        }
        effects
    }

    // ---------------------------------------------------------------------
    // Fetches
    // ---------------------------------------------------------------------

    /// Build the effect for `kind` from the current selections, or `None`
    /// when its inputs are not chosen yet
    fn emit(&mut self, kind: FetchKind) -> Option<WizardEffect> {
        let generation = self.generations.get(kind) + 1;
        let effect = match kind {
            FetchKind::Services => WizardEffect::FetchServices { generation },
            FetchKind::Centers => WizardEffect::FetchCenters {
                service_id: self.service_id?,
                generation,
            },
            FetchKind::Dates => WizardEffect::FetchDates {
                center_id: self.center_id?,
                service_id: self.service_id?,
                generation,
            },
            FetchKind::Slots => WizardEffect::FetchSlots {
                center_id: self.center_id?,
                service_id: self.service_id?,
                date: self.date?,
                generation,
            },
            FetchKind::Profile => WizardEffect::PrefillProfile { generation },
        };

        *self.generations.slot(kind) = generation;
        self.loading.insert(kind);
        Some(effect)
    }

    fn invalidate(&mut self, kind: FetchKind) {
        self.generations.bump(kind);
        self.loading.remove(&kind);
    }

    /// Apply a fetch result. Returns `false` when the result is stale and was
    /// discarded.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        let (kind, generation) = outcome.tag();
        if generation != self.generations.get(kind) {
            tracing::debug!(
                "Discarding stale {:?} response (generation {}, current {})",
                kind,
                generation,
                self.generations.get(kind)
            );
            return false;
        }
        self.loading.remove(&kind);

        match outcome {
            FetchOutcome::Services { result, .. } => match result {
                Ok(services) => {
                    self.services = services.into_iter().filter(|s| s.is_active).collect();
                    if self.selected_service().is_none() && self.service_id.is_some() {
                        self.service_id = None;
                        self.clear_center();
                    }
                }
                Err(message) => self.alert = Some(message),
            },
            FetchOutcome::Centers { result, .. } => match result {
                Ok(centers) => {
                    self.centers = centers.into_iter().filter(|c| c.is_active).collect();
                    if self.center_id.is_some() && self.selected_center().is_none() {
                        self.clear_center();
                    }
                }
                Err(message) => self.alert = Some(message),
            },
            FetchOutcome::Dates { result, .. } => match result {
                Ok(dates) => {
                    self.available_dates = dates;
                    let still_listed = self
                        .date
                        .is_some_and(|d| self.available_dates.iter().any(|a| a.date == d));
                    if self.date.is_some() && !still_listed {
                        self.date = None;
                        self.slot_id = None;
                        self.available_slots.clear();
                        self.invalidate(FetchKind::Slots);
                    }
                }
                Err(message) => self.alert = Some(message),
            },
            FetchOutcome::Slots { result, .. } => match result {
                Ok(slots) => {
                    self.available_slots = slots;
                    if self.selected_slot().is_none_or(|s| !s.is_bookable()) {
                        self.slot_id = None;
                    }
                }
                Err(message) => self.alert = Some(message),
            },
            FetchOutcome::Profile { result, .. } => match result {
                Ok(Some(profile)) => self.prefill(&profile),
                Ok(None) => {}
                // A failed prefill only means the visitor types the details in
                Err(message) => tracing::warn!("Profile prefill failed: {}", message),
            },
        }

        true
    }

    /// Copy profile fields into applicant fields that are still empty
    fn prefill(&mut self, profile: &UserProfile) {
        let a = &mut self.applicant;
        let fields = [
            (&mut a.first_name, profile.first_name.as_deref()),
            (&mut a.last_name, profile.last_name.as_deref()),
            (&mut a.gender, profile.gender.as_deref()),
            (&mut a.date_of_birth, profile.date_of_birth.as_deref()),
            (&mut a.nationality, profile.nationality.as_deref()),
            (&mut a.passport_number, profile.passport_number.as_deref()),
            (&mut a.passport_expiry, profile.passport_expiry.as_deref()),
            (&mut a.phone, profile.phone.as_deref()),
            (&mut a.email, Some(profile.email.as_str())),
        ];
        for (target, value) in fields {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                if target.trim().is_empty() {
                    *target = value.to_string();
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------------

    /// Start submitting from the review step. Returns the request to send and
    /// the submission generation to report the result with.
    pub fn begin_submission(&mut self) -> Result<(BookingRequest, u64)> {
        if self.step != WizardStep::Review {
            return Err(AppError::BadRequest(
                "Review the booking before submitting".to_string(),
            ));
        }
        if self.submitting {
            return Err(AppError::Conflict(
                "The booking is already being submitted".to_string(),
            ));
        }

        let missing: Vec<String> = [
            WizardStep::Category,
            WizardStep::Center,
            WizardStep::ApplicantDetails,
            WizardStep::DateTime,
        ]
        .into_iter()
        .flat_map(|step| self.missing_fields(step))
        .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(missing));
        }

        let (Some(service_id), Some(center_id), Some(date), Some(slot_id)) =
            (self.service_id, self.center_id, self.date, self.slot_id)
        else {
            return Err(AppError::validation("The booking is incomplete"));
        };

        self.submitting = true;
        self.alert = None;
        self.generations.submission += 1;

        let request = BookingRequest {
            service_id,
            center_id,
            date,
            slot_id,
            user_details: self.applicant.clone(),
        };
        Ok((request, self.generations.submission))
    }

    fn owns_submission(&self, generation: u64) -> bool {
        self.submitting && self.generations.submission == generation
    }

    /// Record the backend's confirmation and move to the last step
    pub fn complete_booking(&mut self, generation: u64, confirmation: BookingConfirmation) -> bool {
        if !self.owns_submission(generation) {
            return false;
        }
        self.submitting = false;
        self.booking = Some(confirmation);
        self.step = WizardStep::Confirmation;
        true
    }

    /// Record a rejected submission; the wizard stays on the review step
    pub fn fail_booking(&mut self, generation: u64, message: String) -> bool {
        if !self.owns_submission(generation) {
            return false;
        }
        self.submitting = false;
        self.alert = Some(message);
        true
    }
}
