use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::assistant::dtos::AssistantReplyDto;
use crate::features::assistant::script::AssistantMessage;
use crate::features::assistant::services::AssistantService;
use crate::features::auth::model::SessionContext;
use crate::shared::types::ApiResponse;

/// Start a conversation with the assistant
#[utoipa::path(
    post,
    path = "/api/assistant",
    responses(
        (status = 200, description = "Greeting with the first options", body = ApiResponse<AssistantMessage>)
    ),
    tag = "assistant"
)]
pub async fn start_conversation(
    session: SessionContext,
    State(service): State<Arc<AssistantService>>,
) -> Json<ApiResponse<AssistantMessage>> {
    session.keep();
    let message = service.start(session.session_id).await;
    Json(ApiResponse::success(Some(message), None, None))
}

/// Pick one of the options offered by the last message
#[utoipa::path(
    post,
    path = "/api/assistant/reply",
    request_body = AssistantReplyDto,
    responses(
        (status = 200, description = "Next assistant message", body = ApiResponse<AssistantMessage>),
        (status = 400, description = "Unknown option")
    ),
    tag = "assistant"
)]
pub async fn reply(
    session: SessionContext,
    State(service): State<Arc<AssistantService>>,
    AppJson(dto): AppJson<AssistantReplyDto>,
) -> Result<Json<ApiResponse<AssistantMessage>>> {
    dto.validate()?;

    session.keep();
    let backend = service.backend_for(&session);
    let message = service
        .reply(&backend, session.session_id, &dto.option)
        .await?;
    Ok(Json(ApiResponse::success(Some(message), None, None)))
}
