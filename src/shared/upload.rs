use std::collections::BTreeMap;

use axum::extract::Multipart;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::modules::backend::DocumentUpload;
use crate::shared::constants::{is_document_type_allowed, ALLOWED_DOCUMENT_TYPES, MAX_DOCUMENT_SIZE};

/// A multipart form split into its text fields and its documents
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: BTreeMap<String, String>,
    pub documents: Vec<DocumentUpload>,
}

impl UploadForm {
    /// Read every part of the form, checking each document's size and type.
    ///
    /// File inputs left empty by the browser (no name, no bytes) are skipped.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        })? {
            let name = field.name().unwrap_or_default().to_string();
            if name.is_empty() {
                debug!("Ignoring unnamed multipart field");
                continue;
            }

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .map(str::to_string)
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    let bytes = field.bytes().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read file data: {}", e))
                    })?;

                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }

                    let document = DocumentUpload {
                        field: name,
                        file_name: if file_name.is_empty() {
                            "unnamed".to_string()
                        } else {
                            file_name
                        },
                        content_type,
                        bytes: bytes.to_vec(),
                    };
                    check_document(&document)?;
                    form.documents.push(document);
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text field, `None` when missing or blank
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Checkbox-style flag: "true", "on", "yes" or "1"
    pub fn flag(&self, name: &str) -> bool {
        self.text(name)
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "on" | "yes" | "1"))
            .unwrap_or(false)
    }

    /// Take the single document of a one-file form
    pub fn into_single_document(mut self, field: &str) -> Result<DocumentUpload> {
        let index = self
            .documents
            .iter()
            .position(|d| d.field == field)
            .ok_or_else(|| AppError::BadRequest(format!("The '{}' file is required", field)))?;
        Ok(self.documents.swap_remove(index))
    }
}

/// Size and type limits every forwarded document must meet
pub fn check_document(document: &DocumentUpload) -> Result<()> {
    if document.bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(AppError::BadRequest(format!(
            "File '{}' is too large. Maximum size is {} MB",
            document.file_name,
            MAX_DOCUMENT_SIZE / 1024 / 1024
        )));
    }

    if !is_document_type_allowed(&document.content_type) {
        return Err(AppError::BadRequest(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            document.content_type,
            ALLOWED_DOCUMENT_TYPES.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(content_type: &str, size: usize) -> DocumentUpload {
        DocumentUpload {
            field: "passport_copy".to_string(),
            file_name: "scan".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn test_check_document_limits() {
        assert!(check_document(&document("application/pdf", 1024)).is_ok());
        assert!(check_document(&document("application/zip", 1024)).is_err());
        assert!(check_document(&document("image/png", MAX_DOCUMENT_SIZE + 1)).is_err());
    }

    #[test]
    fn test_text_and_flag_helpers() {
        let mut form = UploadForm::default();
        form.fields.insert("first_name".to_string(), "  Ada ".to_string());
        form.fields.insert("blank".to_string(), "   ".to_string());
        form.fields.insert("on_behalf_of".to_string(), "on".to_string());

        assert_eq!(form.text("first_name").as_deref(), Some("Ada"));
        assert_eq!(form.text("blank"), None);
        assert!(form.flag("on_behalf_of"));
        assert!(!form.flag("missing"));
    }

    #[test]
    fn test_single_document_is_required() {
        let form = UploadForm::default();
        assert!(form.into_single_document("passport").is_err());
    }
}
