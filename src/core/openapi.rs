use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::core::config::SessionConfig;
use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::applications::{dtos as applications_dtos, handlers as applications_handlers};
use crate::features::assistant::{dtos as assistant_dtos, handlers as assistant_handlers, script};
use crate::features::auth;
use crate::features::booking::{dtos as booking_dtos, handlers as booking_handlers, wizard};
use crate::features::catalog::{dtos as catalog_dtos, handlers as catalog_handlers};
use crate::modules::backend as models;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::get_me,
        // Catalog
        catalog_handlers::list_services,
        catalog_handlers::list_categories,
        catalog_handlers::get_service,
        catalog_handlers::list_centers,
        // Booking wizard
        booking_handlers::start_wizard,
        booking_handlers::get_wizard,
        booking_handlers::select_service,
        booking_handlers::select_center,
        booking_handlers::update_applicant,
        booking_handlers::select_date,
        booking_handlers::select_slot,
        booking_handlers::next_step,
        booking_handlers::previous_step,
        booking_handlers::submit_booking,
        booking_handlers::reset_wizard,
        booking_handlers::print_confirmation,
        // Applications
        applications_handlers::submit_application,
        applications_handlers::track_application,
        applications_handlers::download_filled_pdf,
        applications_handlers::download_file,
        applications_handlers::extract_passport,
        // Assistant
        assistant_handlers::start_conversation,
        assistant_handlers::reply,
        // Admin
        admin_handlers::bulk_create_slots,
        admin_handlers::bulk_toggle_slots,
        admin_handlers::attach_application_file,
        admin_handlers::preview_template,
    ),
    components(
        schemas(
            Meta,
            // Auth
            auth::dtos::LoginRequestDto,
            auth::dtos::RegisterRequestDto,
            auth::dtos::SessionUserDto,
            ApiResponse<auth::dtos::SessionUserDto>,
            // Catalog
            models::Service,
            models::ServiceCategory,
            models::ServiceDetail,
            models::Fee,
            models::RequiredDocument,
            models::Center,
            models::OperatingHours,
            catalog_dtos::ServiceListingDto,
            catalog_dtos::ServiceGroupDto,
            ApiResponse<catalog_dtos::ServiceListingDto>,
            ApiResponse<Vec<models::Center>>,
            // Booking
            wizard::WizardStep,
            booking_dtos::SelectServiceDto,
            booking_dtos::SelectCenterDto,
            booking_dtos::SelectDateDto,
            booking_dtos::SelectSlotDto,
            booking_dtos::ApplicantDetailsDto,
            booking_dtos::WizardViewDto,
            models::AvailableDate,
            models::AvailableSlot,
            models::BookingConfirmation,
            ApiResponse<booking_dtos::WizardViewDto>,
            // Applications
            applications_dtos::MiscellaneousApplicationUpload,
            applications_dtos::PassportScanUpload,
            models::Application,
            models::ApplicationStatus,
            models::ApplicationFile,
            models::ApplicationTracking,
            models::ApplicantInfo,
            ApiResponse<models::Application>,
            ApiResponse<models::ApplicationTracking>,
            // Assistant
            assistant_dtos::AssistantReplyDto,
            script::AssistantMessage,
            script::ChatOption,
            script::ChatAction,
            ApiResponse<script::AssistantMessage>,
            // Admin
            admin_dtos::ServiceInput,
            admin_dtos::ServiceDetailInput,
            admin_dtos::CenterInput,
            admin_dtos::CounterInput,
            admin_dtos::TimeSlotInput,
            admin_dtos::BulkCreateSlotsDto,
            admin_dtos::BulkToggleSlotsDto,
            admin_dtos::BulkCreateSlotsResponseDto,
            admin_dtos::BulkToggleSlotsResponseDto,
            admin_dtos::ApplicationStatusUpdate,
            admin_dtos::AppointmentStatusUpdate,
            admin_dtos::NotificationTemplateInput,
            admin_dtos::TemplatePreviewDto,
            admin_dtos::TemplatePreviewResponseDto,
            admin_dtos::AttachFileUpload,
            models::Counter,
            models::TimeSlot,
            models::Appointment,
            models::AppointmentStatus,
            models::NotificationTemplate,
            ApiResponse<admin_dtos::BulkCreateSlotsResponseDto>,
            ApiResponse<admin_dtos::TemplatePreviewResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Visitor login, registration and session"),
        (name = "catalog", description = "Services, categories and service centers (public)"),
        (name = "booking", description = "Seven-step appointment booking wizard"),
        (name = "applications", description = "Miscellaneous applications, documents and passport OCR"),
        (name = "assistant", description = "Guided chat assistant"),
        (name = "admin", description = "Back office (admin and super admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Consular Portal API",
        version = "0.1.0",
        description = "Citizen and back-office API for consular services",
    )
)]
pub struct ApiDoc;

/// Adds the portal session cookie as the security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    SessionConfig::DEFAULT_COOKIE_NAME,
                ))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_feature() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/auth/login"));
        assert!(paths.contains_key("/api/services"));
        assert!(paths.contains_key("/api/booking/wizard/submit"));
        assert!(paths.contains_key("/api/applications/miscellaneous"));
        assert!(paths.contains_key("/api/assistant/reply"));
        assert!(paths.contains_key("/api/admin/time-slots/bulk-create"));
    }
}
