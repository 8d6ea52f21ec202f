use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// The option the visitor picked, as sent in [`ChatOption::id`](crate::features::assistant::script::ChatOption)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssistantReplyDto {
    #[validate(length(min = 1, max = 64, message = "Please choose an option"))]
    #[schema(example = "service:1")]
    pub option: String,
}
