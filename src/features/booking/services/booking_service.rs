use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use minijinja::context;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::SessionContext;
use crate::features::booking::dtos::{ApplicantDetailsDto, WizardViewDto};
use crate::features::booking::wizard::{
    BookingWizard, FetchOutcome, WizardEffect, WizardStep,
};
use crate::modules::backend::{BackendClient, BackendSession, BookingBackend};
use crate::shared::templates::render_template;

const CONFIRMATION_TEMPLATE: &str = "booking/confirmation.html.jinja";

struct ActiveWizard {
    wizard: BookingWizard,
    last_touched: Instant,
}

/// Runs one booking wizard per portal session.
///
/// Transitions happen under the store lock; the fetches they request run
/// after the lock is released and their results are applied under a fresh
/// lock, where stale generations are dropped.
pub struct BookingService {
    client: BackendClient,
    wizards: RwLock<HashMap<Uuid, ActiveWizard>>,
    idle_ttl: Duration,
}

fn no_wizard() -> AppError {
    AppError::NotFound("No booking in progress, start a new booking first".to_string())
}

/// Perform one effect against the backend
async fn execute(backend: &dyn BookingBackend, effect: WizardEffect) -> FetchOutcome {
    match effect {
        WizardEffect::FetchServices { generation } => FetchOutcome::Services {
            generation,
            result: backend.list_services().await.map_err(|e| fetch_error("services", e)),
        },
        WizardEffect::FetchCenters {
            service_id,
            generation,
        } => FetchOutcome::Centers {
            generation,
            result: backend
                .list_centers(service_id)
                .await
                .map_err(|e| fetch_error("centers", e)),
        },
        WizardEffect::FetchDates {
            center_id,
            service_id,
            generation,
        } => FetchOutcome::Dates {
            generation,
            result: backend
                .available_dates(center_id, service_id)
                .await
                .map_err(|e| fetch_error("available dates", e)),
        },
        WizardEffect::FetchSlots {
            center_id,
            service_id,
            date,
            generation,
        } => FetchOutcome::Slots {
            generation,
            result: backend
                .available_slots(center_id, service_id, date)
                .await
                .map_err(|e| fetch_error("available time slots", e)),
        },
        WizardEffect::PrefillProfile { generation } => FetchOutcome::Profile {
            generation,
            result: backend
                .current_user()
                .await
                .map_err(|e| fetch_error("profile", e)),
        },
    }
}

fn fetch_error(what: &str, error: AppError) -> String {
    tracing::warn!("Failed to load {}: {}", what, error);
    match error {
        AppError::Backend { message, .. } => message,
        other => format!("Failed to load {}. {}", what, other.user_message()),
    }
}

impl BookingService {
    pub fn new(client: BackendClient, idle_ttl: Duration) -> Self {
        Self {
            client,
            wizards: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Backend gateway carrying the visitor's credentials
    pub fn backend_for(&self, session: &SessionContext) -> BackendSession {
        self.client.session(session.credentials.clone())
    }

    /// Start a booking, discarding any booking already in progress
    pub async fn start(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
    ) -> Result<WizardViewDto> {
        let effects = {
            let mut wizards = self.wizards.write().await;
            match wizards.get_mut(&session_id) {
                Some(active) => {
                    active.last_touched = Instant::now();
                    active.wizard.reset()
                }
                None => {
                    let (wizard, effects) = BookingWizard::start();
                    wizards.insert(
                        session_id,
                        ActiveWizard {
                            wizard,
                            last_touched: Instant::now(),
                        },
                    );
                    effects
                }
            }
        };

        tracing::debug!("Booking wizard started for session {}", session_id);
        self.run_effects(backend, session_id, effects).await;
        self.view(session_id).await
    }

    pub async fn view(&self, session_id: Uuid) -> Result<WizardViewDto> {
        let wizards = self.wizards.read().await;
        let active = wizards.get(&session_id).ok_or_else(no_wizard)?;
        Ok(WizardViewDto::from(&active.wizard))
    }

    pub async fn select_service(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        service_id: i64,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, |w| {
            w.select_service(service_id).map(|_| Vec::new())
        })
        .await
    }

    pub async fn select_center(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        center_id: i64,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, |w| {
            w.select_center(center_id).map(|_| Vec::new())
        })
        .await
    }

    pub async fn update_applicant(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        patch: ApplicantDetailsDto,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, |w| {
            w.update_applicant(patch).map(|_| Vec::new())
        })
        .await
    }

    pub async fn select_date(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        date: NaiveDate,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, |w| w.select_date(date))
            .await
    }

    pub async fn select_slot(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        slot_id: i64,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, |w| {
            w.select_slot(slot_id).map(|_| Vec::new())
        })
        .await
    }

    pub async fn advance(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, BookingWizard::advance)
            .await
    }

    pub async fn back(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, BookingWizard::back)
            .await
    }

    /// Send the reviewed booking. A rejection leaves the wizard on the review
    /// step and returns the backend's message unchanged.
    pub async fn submit(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
    ) -> Result<WizardViewDto> {
        let (request, generation) = {
            let mut wizards = self.wizards.write().await;
            let active = wizards.get_mut(&session_id).ok_or_else(no_wizard)?;
            active.last_touched = Instant::now();
            active.wizard.begin_submission()?
        };

        let result = backend.create_booking(&request).await;
        if let Ok(confirmation) = &result {
            tracing::info!(
                "Booking {} confirmed for session {}",
                confirmation.appointment_id,
                session_id
            );
        }

        let mut wizards = self.wizards.write().await;
        let Some(active) = wizards.get_mut(&session_id) else {
            // Purged while the backend was booking; the visitor still needs the reference
            return Err(match result {
                Ok(confirmation) => {
                    tracing::warn!(
                        "Booking {} confirmed but the wizard for session {} is gone",
                        confirmation.appointment_id,
                        session_id
                    );
                    AppError::Conflict(format!(
                        "Your appointment {} is booked, but this booking session expired \
                         before the confirmation could be shown. Please keep this reference.",
                        confirmation.appointment_id
                    ))
                }
                Err(e) => e,
            });
        };

        match result {
            Ok(confirmation) => {
                if !active.wizard.complete_booking(generation, confirmation) {
                    tracing::warn!(
                        "Booking confirmed after the wizard was restarted (session {})",
                        session_id
                    );
                }
                Ok(WizardViewDto::from(&active.wizard))
            }
            Err(e) => {
                tracing::warn!("Booking rejected for session {}: {}", session_id, e);
                active.wizard.fail_booking(generation, e.user_message());
                Err(e)
            }
        }
    }

    /// "Book another": back to step 1 with a fresh service list
    pub async fn reset(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
    ) -> Result<WizardViewDto> {
        self.transition(backend, session_id, |w| Ok(w.reset()))
            .await
    }

    /// Printable HTML confirmation of the completed booking
    pub async fn confirmation_html(&self, session_id: Uuid) -> Result<String> {
        let wizards = self.wizards.read().await;
        let wizard = &wizards.get(&session_id).ok_or_else(no_wizard)?.wizard;

        let booking = match (wizard.step(), wizard.booking()) {
            (WizardStep::Confirmation, Some(booking)) => booking,
            _ => {
                return Err(AppError::BadRequest(
                    "There is no confirmed booking to print".to_string(),
                ))
            }
        };

        let date = wizard
            .date()
            .map(|d| d.format("%A, %d %B %Y").to_string())
            .unwrap_or_default();
        let slot = wizard
            .selected_slot()
            .map(|s| s.label())
            .unwrap_or_default();

        let ctx = context! {
            appointment_id => &booking.appointment_id,
            confirmation => &booking.confirmation,
            service => wizard.selected_service(),
            center => wizard.selected_center(),
            applicant => wizard.applicant(),
            applicant_count => wizard.applicant_count(),
            date => date,
            slot => slot,
            generated_at => Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        };

        render_template(CONFIRMATION_TEMPLATE, ctx).map_err(|e| {
            tracing::error!("Failed to render booking confirmation: {}", e);
            AppError::Internal(e.to_string())
        })
    }

    /// Forget wizards idle for longer than the TTL; returns how many went
    pub async fn purge_expired(&self) -> usize {
        let ttl = self.idle_ttl;
        let mut wizards = self.wizards.write().await;
        let before = wizards.len();
        wizards.retain(|_, active| active.last_touched.elapsed() <= ttl);
        before - wizards.len()
    }

    async fn transition<F>(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        step: F,
    ) -> Result<WizardViewDto>
    where
        F: FnOnce(&mut BookingWizard) -> Result<Vec<WizardEffect>>,
    {
        let effects = {
            let mut wizards = self.wizards.write().await;
            let active = wizards.get_mut(&session_id).ok_or_else(no_wizard)?;
            active.last_touched = Instant::now();
            step(&mut active.wizard)?
        };

        self.run_effects(backend, session_id, effects).await;
        self.view(session_id).await
    }

    async fn run_effects(
        &self,
        backend: &dyn BookingBackend,
        session_id: Uuid,
        effects: Vec<WizardEffect>,
    ) {
        if effects.is_empty() {
            return;
        }

        let outcomes = join_all(effects.into_iter().map(|e| execute(backend, e))).await;

        let mut wizards = self.wizards.write().await;
        if let Some(active) = wizards.get_mut(&session_id) {
            for outcome in outcomes {
                active.wizard.apply(outcome);
            }
        }
    }
}
