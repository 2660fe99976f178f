use crate::llm::openai::{ChatCompletionRequest, ChatMessage, ChatRole, ResponseFormat};
use crate::plan::schema::{SCHEMA_NAME, plan_schema};

use super::Language;

const SYSTEM_MESSAGE: &str = "You are a Hong Kong household chef. You plan home meals, \
write shopping lists for local wet markets and supermarkets, and answer only with JSON \
that matches the provided schema.";

pub fn build_prompt(household_size: u32, dish_description: &str, language: Language) -> String {
    let people = if household_size == 1 { "person" } else { "people" };
    format!(
        "Task: shopping list and cooking steps for \"{dish}\" ({household_size} {people}).

Rules:
1. Dishes: one entry per distinct dish named in the request.
2. Common ingredients: items shared across dishes (rice, oil, salt, ...) go to commonIngredients once; do not repeat them inside dishes.
3. Units:
   - marketQuantity: Hong Kong wet-market units (斤/兩/份).
   - supermarketQuantity: metric units (g/kg/pack).
4. Prices: two whole-number HKD estimates per ingredient, wet market and supermarket.
5. Steps: concise cooking steps in execution order.
6. portionSize must be exactly {household_size}.

Language: write dish names, notes, tips and steps in {lang}. Keep the unit conventions above regardless of language.",
        dish = dish_description.trim(),
        lang = language.prompt_name(),
    )
}

/// Full chat request carrying the prompt and the structured output constraint.
pub fn build_request(
    household_size: u32,
    dish_description: &str,
    language: Language,
    model: Option<&str>,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.map(str::to_string),
        messages: vec![
            ChatMessage::new(ChatRole::System, SYSTEM_MESSAGE),
            ChatMessage::new(
                ChatRole::User,
                build_prompt(household_size, dish_description, language),
            ),
        ],
        max_tokens: None,
        temperature: None,
        response_format: Some(ResponseFormat {
            name: SCHEMA_NAME.to_string(),
            schema: plan_schema(),
            strict: true,
        }),
    }
}
