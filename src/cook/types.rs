use serde::Serialize;
use serde_json::Value;

use crate::generate::Language;
use crate::llm::openai::ChatCompletionRequest;
use crate::plan::{CostEstimate, Plan};

#[derive(Serialize)]
pub struct CookMessage {
    pub role: &'static str,
    pub content: String,
}

/// What `cook --dry-run` would send.
#[derive(Serialize)]
pub struct CookPlan {
    pub action: &'static str,
    pub household_size: u32,
    pub dish_description: String,
    pub language: Language,
    pub model: Option<String>,
    pub messages: Vec<CookMessage>,
    pub schema: Option<Value>,
    pub save: bool,
}

impl CookPlan {
    pub fn from_request(
        request: &ChatCompletionRequest,
        household_size: u32,
        dish_description: &str,
        language: Language,
        save: bool,
    ) -> Self {
        Self {
            action: "generate",
            household_size,
            dish_description: dish_description.to_string(),
            language,
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| CookMessage { role: m.role.as_str(), content: m.content.clone() })
                .collect(),
            schema: request.response_format.as_ref().map(|f| f.schema.clone()),
            save,
        }
    }
}

#[derive(Serialize)]
pub struct CookResult<'a> {
    pub title: String,
    pub language: Language,
    pub dish_description: &'a str,
    pub estimated_cost: CostEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<String>,
    pub plan: &'a Plan,
}
