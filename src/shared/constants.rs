/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Back-office staff - full access to the admin console
pub const ROLE_ADMIN: &str = "admin";

/// Super admin - everything an admin can do
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

// =============================================================================
// SESSIONS
// =============================================================================

/// How often idle sessions, wizards and conversations are swept
pub const SESSION_PURGE_INTERVAL_SECS: u64 = 300;

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

/// Maximum size of a single uploaded document (10MB)
pub const MAX_DOCUMENT_SIZE: usize = 10 * 1024 * 1024;

/// Document types accepted for applications and OCR
pub const ALLOWED_DOCUMENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "application/pdf",
];

/// Check if a MIME type is accepted for document uploads
pub fn is_document_type_allowed(content_type: &str) -> bool {
    ALLOWED_DOCUMENT_TYPES.contains(&content_type)
}

// =============================================================================
// BOOKING
// =============================================================================

/// Applicants per booking; the wizard has no multi-applicant flow yet
pub const APPLICANTS_PER_BOOKING: u8 = 1;

/// Upper bound on slots generated by a single bulk-create request
pub const MAX_BULK_SLOTS: usize = 96;

// =============================================================================
// ASSISTANT
// =============================================================================

/// Dates offered as buttons in one assistant message
pub const ASSISTANT_MAX_DATES: usize = 7;
