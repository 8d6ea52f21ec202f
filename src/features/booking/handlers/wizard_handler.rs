use std::sync::Arc;

use axum::{extract::State, response::Html, Json};

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::SessionContext;
use crate::features::booking::dtos::{
    ApplicantDetailsDto, SelectCenterDto, SelectDateDto, SelectServiceDto, SelectSlotDto,
    WizardViewDto,
};
use crate::features::booking::services::BookingService;
use crate::shared::types::ApiResponse;

type WizardResponse = Result<Json<ApiResponse<WizardViewDto>>>;

fn ok(view: WizardViewDto) -> WizardResponse {
    Ok(Json(ApiResponse::success(Some(view), None, None)))
}

/// Start a new booking (discards any booking in progress)
#[utoipa::path(
    post,
    path = "/api/booking/wizard",
    responses(
        (status = 200, description = "Wizard on step 1 with the service list", body = ApiResponse<WizardViewDto>),
    ),
    tag = "booking"
)]
pub async fn start_wizard(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
) -> WizardResponse {
    session.keep();
    let backend = service.backend_for(&session);
    ok(service.start(&backend, session.session_id).await?)
}

/// Current state of the booking
#[utoipa::path(
    get,
    path = "/api/booking/wizard",
    responses(
        (status = 200, description = "Current wizard state", body = ApiResponse<WizardViewDto>),
        (status = 404, description = "No booking in progress")
    ),
    tag = "booking"
)]
pub async fn get_wizard(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
) -> WizardResponse {
    ok(service.view(session.session_id).await?)
}

/// Choose the service (step 1)
#[utoipa::path(
    put,
    path = "/api/booking/wizard/service",
    request_body = SelectServiceDto,
    responses(
        (status = 200, description = "Service chosen", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Unknown service or wrong step")
    ),
    tag = "booking"
)]
pub async fn select_service(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
    AppJson(dto): AppJson<SelectServiceDto>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service
        .select_service(&backend, session.session_id, dto.service_id)
        .await?)
}

/// Choose the center (step 2)
#[utoipa::path(
    put,
    path = "/api/booking/wizard/center",
    request_body = SelectCenterDto,
    responses(
        (status = 200, description = "Center chosen", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Unknown center or wrong step")
    ),
    tag = "booking"
)]
pub async fn select_center(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
    AppJson(dto): AppJson<SelectCenterDto>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service
        .select_center(&backend, session.session_id, dto.center_id)
        .await?)
}

/// Fill in applicant details (step 3)
#[utoipa::path(
    put,
    path = "/api/booking/wizard/applicant",
    request_body = ApplicantDetailsDto,
    responses(
        (status = 200, description = "Details updated", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Wrong step")
    ),
    tag = "booking"
)]
pub async fn update_applicant(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
    AppJson(dto): AppJson<ApplicantDetailsDto>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service
        .update_applicant(&backend, session.session_id, dto)
        .await?)
}

/// Choose the date and load its time slots (step 5)
#[utoipa::path(
    put,
    path = "/api/booking/wizard/date",
    request_body = SelectDateDto,
    responses(
        (status = 200, description = "Date chosen, slots loaded", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Date not available or wrong step")
    ),
    tag = "booking"
)]
pub async fn select_date(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
    AppJson(dto): AppJson<SelectDateDto>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service
        .select_date(&backend, session.session_id, dto.date)
        .await?)
}

/// Choose the time slot (step 5)
#[utoipa::path(
    put,
    path = "/api/booking/wizard/slot",
    request_body = SelectSlotDto,
    responses(
        (status = 200, description = "Slot chosen", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Slot not available or wrong step")
    ),
    tag = "booking"
)]
pub async fn select_slot(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
    AppJson(dto): AppJson<SelectSlotDto>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service
        .select_slot(&backend, session.session_id, dto.slot_id)
        .await?)
}

/// Continue to the next step
#[utoipa::path(
    post,
    path = "/api/booking/wizard/next",
    responses(
        (status = 200, description = "Moved forward", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Current step incomplete; `errors` lists what is missing")
    ),
    tag = "booking"
)]
pub async fn next_step(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service.advance(&backend, session.session_id).await?)
}

/// Return to the previous step
#[utoipa::path(
    post,
    path = "/api/booking/wizard/back",
    responses(
        (status = 200, description = "Moved back", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Already at the first step or booking complete")
    ),
    tag = "booking"
)]
pub async fn previous_step(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service.back(&backend, session.session_id).await?)
}

/// Submit the reviewed booking (step 6)
#[utoipa::path(
    post,
    path = "/api/booking/wizard/submit",
    responses(
        (status = 200, description = "Booking confirmed", body = ApiResponse<WizardViewDto>),
        (status = 400, description = "Not on the review step"),
        (status = 409, description = "Slot no longer available")
    ),
    tag = "booking"
)]
pub async fn submit_booking(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service.submit(&backend, session.session_id).await?)
}

/// Book another appointment
#[utoipa::path(
    post,
    path = "/api/booking/wizard/reset",
    responses(
        (status = 200, description = "Wizard back on step 1", body = ApiResponse<WizardViewDto>),
    ),
    tag = "booking"
)]
pub async fn reset_wizard(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
) -> WizardResponse {
    let backend = service.backend_for(&session);
    ok(service.reset(&backend, session.session_id).await?)
}

/// Printable confirmation page
#[utoipa::path(
    get,
    path = "/api/booking/wizard/confirmation",
    responses(
        (status = 200, description = "Printable HTML confirmation", content_type = "text/html", body = String),
        (status = 400, description = "No confirmed booking")
    ),
    tag = "booking"
)]
pub async fn print_confirmation(
    session: SessionContext,
    State(service): State<Arc<BookingService>>,
) -> Result<Html<String>> {
    Ok(Html(service.confirmation_html(session.session_id).await?))
}
