use reqwest::Method;
use serde_json::Value;

use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::{
    AdminListQuery, BulkCreateSlotsDto, BulkToggleSlotsDto, TemplatePreviewDto,
    TemplatePreviewResponseDto,
};
use crate::features::admin::resource::AdminResource;
use crate::features::admin::slots::generate_slot_ranges;
use crate::features::auth::model::SessionContext;
use crate::modules::backend::{envelope, BackendClient, BackendSession, DocumentUpload, TimeSlot};
use crate::shared::templates::render_source;

/// Back-office operations, all forwarded with the staff member's credentials
pub struct AdminService {
    client: BackendClient,
}

fn item_path<R: AdminResource>(id: &str) -> String {
    format!("{}/{}", R::BACKEND_PATH, urlencoding::encode(id))
}

fn not_found<R: AdminResource>(id: &str) -> impl FnOnce(AppError) -> AppError + '_ {
    move |e| match e {
        AppError::Backend { status: 404, .. } => {
            AppError::NotFound(format!("{} {} not found", R::LABEL, id))
        }
        other => other,
    }
}

impl AdminService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    fn backend(&self, session: &SessionContext) -> BackendSession {
        self.client.session(session.credentials.clone())
    }

    pub async fn list<R: AdminResource>(
        &self,
        session: &SessionContext,
        query: &AdminListQuery,
    ) -> Result<(Vec<R::Record>, i64)> {
        let params = query.backend_params();
        self.backend(session)
            .get_list(R::BACKEND_PATH, &params, Some(R::LIST_KEY), R::LABEL)
            .await
    }

    pub async fn get<R: AdminResource>(
        &self,
        session: &SessionContext,
        id: &str,
    ) -> Result<R::Record> {
        self.backend(session)
            .get(&item_path::<R>(id), &[], Some(R::RECORD_KEY), R::LABEL)
            .await
            .map_err(not_found::<R>(id))
    }

    pub async fn create<R: AdminResource>(
        &self,
        session: &SessionContext,
        payload: &R::Create,
    ) -> Result<R::Record> {
        let record = self
            .backend(session)
            .send(
                Method::POST,
                R::BACKEND_PATH,
                payload,
                Some(R::RECORD_KEY),
                R::LABEL,
            )
            .await?;
        tracing::info!("{} created", R::LABEL);
        Ok(record)
    }

    pub async fn update<R: AdminResource>(
        &self,
        session: &SessionContext,
        id: &str,
        payload: &R::Update,
    ) -> Result<R::Record> {
        let record = self
            .backend(session)
            .send(
                Method::PUT,
                &item_path::<R>(id),
                payload,
                Some(R::RECORD_KEY),
                R::LABEL,
            )
            .await
            .map_err(not_found::<R>(id))?;
        tracing::info!("{} {} updated", R::LABEL, id);
        Ok(record)
    }

    pub async fn delete<R: AdminResource>(&self, session: &SessionContext, id: &str) -> Result<()> {
        self.backend(session)
            .execute(Method::DELETE, &item_path::<R>(id))
            .await
            .map_err(not_found::<R>(id))?;
        tracing::info!("{} {} deleted", R::LABEL, id);
        Ok(())
    }

    /// Flip the record's active flag on the backend
    pub async fn toggle<R: AdminResource>(
        &self,
        session: &SessionContext,
        id: &str,
    ) -> Result<R::Record> {
        let reply = self
            .backend(session)
            .call::<Value>(Method::PATCH, &format!("{}/toggle", item_path::<R>(id)), None)
            .await
            .map_err(not_found::<R>(id))?;
        tracing::info!("{} {} toggled", R::LABEL, id);
        envelope::decode(envelope::payload(reply.body, Some(R::RECORD_KEY)), R::LABEL)
    }

    pub async fn bulk_create_slots(
        &self,
        session: &SessionContext,
        dto: &BulkCreateSlotsDto,
    ) -> Result<Vec<TimeSlot>> {
        let slots = generate_slot_ranges(
            &dto.start_time,
            &dto.end_time,
            dto.duration_minutes,
            dto.is_active,
        )?;
        self.backend(session).bulk_create_time_slots(&slots).await
    }

    pub async fn bulk_toggle_slots(
        &self,
        session: &SessionContext,
        dto: &BulkToggleSlotsDto,
    ) -> Result<i64> {
        self.backend(session)
            .bulk_toggle_time_slots(&dto.ids, dto.is_active)
            .await
    }

    pub async fn attach_application_file(
        &self,
        session: &SessionContext,
        application_id: i64,
        document_type: Option<String>,
        document: DocumentUpload,
    ) -> Result<Value> {
        let file = self
            .backend(session)
            .attach_application_file(application_id, document_type, document)
            .await?;
        tracing::info!("Document attached to application {}", application_id);
        Ok(file)
    }

    /// Render a notification template locally, without sending anything
    pub fn preview_template(&self, dto: &TemplatePreviewDto) -> Result<TemplatePreviewResponseDto> {
        let ctx = minijinja::Value::from_serialize(&dto.context);
        let render = |source: &str| {
            render_source(source, ctx.clone())
                .map_err(|e| AppError::validation(format!("Template error: {}", e)))
        };

        let subject = render(&dto.subject)?;
        let body = render(&dto.body)?;

        let mut missing_variables = subject.missing_variables;
        missing_variables.extend(body.missing_variables);
        missing_variables.sort();
        missing_variables.dedup();

        Ok(TemplatePreviewResponseDto {
            subject: subject.output,
            body: body.output,
            missing_variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::admin::resource::{Appointments, TimeSlots};
    use crate::shared::test_helpers::{admin_session, backend_client, spawn_mock_backend};
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[tokio::test]
    async fn test_list_forwards_filters_and_total() {
        let router = Router::new().route(
            "/admin/time-slots",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("limit").map(String::as_str), Some("20"));
                Json(json!({
                    "success": true,
                    "data": {
                        "slots": [{"id": 1, "start_time": "09:00", "end_time": "09:30"}],
                        "pagination": {"total": 12}
                    }
                }))
            }),
        );
        let service = AdminService::new(backend_client(spawn_mock_backend(router).await));

        let query = AdminListQuery {
            page_size: Some(20),
            ..Default::default()
        };
        let (slots, total) = service
            .list::<TimeSlots>(&admin_session(), &query)
            .await
            .unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let router = Router::new().route(
            "/admin/appointments/{id}",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"success": false, "error": {"message": "gone"}})),
                )
            }),
        );
        let service = AdminService::new(backend_client(spawn_mock_backend(router).await));

        let err = service
            .get::<Appointments>(&admin_session(), "APT-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Appointment APT-1 not found"));
    }

    #[test]
    fn test_preview_reports_missing_variables() {
        let service = AdminService::new(backend_client("http://127.0.0.1:9".to_string()));
        let mut context = BTreeMap::new();
        context.insert("first_name".to_string(), json!("Ada"));

        let preview = service
            .preview_template(&TemplatePreviewDto {
                subject: "Appointment {{ appointment_id }}".to_string(),
                body: "Dear {{ first_name }}, see you on {{ date }}.".to_string(),
                context,
            })
            .unwrap();

        assert_eq!(preview.body, "Dear Ada, see you on .");
        assert_eq!(preview.missing_variables, vec!["appointment_id", "date"]);
    }

    #[test]
    fn test_preview_syntax_error_is_validation() {
        let service = AdminService::new(backend_client("http://127.0.0.1:9".to_string()));
        let err = service
            .preview_template(&TemplatePreviewDto {
                subject: "{% if %}".to_string(),
                body: "ok".to_string(),
                context: BTreeMap::new(),
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
