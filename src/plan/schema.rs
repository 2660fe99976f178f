use serde_json::{Value, json};

/// Name attached to the structured output constraint.
pub const SCHEMA_NAME: &str = "meal_plan";

fn ingredient_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "description": "Name" },
            "marketQuantity": { "type": "string", "description": "HK market unit (e.g. 半斤, 4兩)" },
            "supermarketQuantity": { "type": "string", "description": "Metric unit (e.g. 300g, 1 pack)" },
            "prices": {
                "type": "object",
                "properties": {
                    "market": { "type": "integer", "description": "HKD price (wet market)" },
                    "supermarket": { "type": "integer", "description": "HKD price (supermarket)" }
                },
                "required": ["market", "supermarket"],
                "additionalProperties": false
            },
            "notes": { "type": "string", "description": "Very brief note" }
        },
        "required": ["name", "marketQuantity", "supermarketQuantity", "prices", "notes"],
        "additionalProperties": false
    })
}

/// JSON schema the generation service must answer with. Mirrors [`super::Plan`].
pub fn plan_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dishes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Dish name" },
                        "ingredients": { "type": "array", "items": ingredient_schema() },
                        "cookingSteps": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Concise steps"
                        }
                    },
                    "required": ["name", "ingredients", "cookingSteps"],
                    "additionalProperties": false
                }
            },
            "commonIngredients": {
                "type": "array",
                "items": ingredient_schema(),
                "description": "Shared items (oil, rice, etc)"
            },
            "portionSize": { "type": "integer" },
            "shoppingTips": { "type": "array", "items": { "type": "string" } },
            "wastePreventionTip": { "type": "string" }
        },
        "required": ["dishes", "commonIngredients", "portionSize", "shoppingTips", "wastePreventionTip"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures;

    fn required(v: &Value) -> Vec<&str> {
        v["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap())
            .collect()
    }

    // every serialized field of the model must be declared and required
    #[test]
    fn schema_matches_serialized_plan_fields() {
        let schema = plan_schema();
        let sample = serde_json::to_value(fixtures::plan("蒸魚", 2)).unwrap();

        let mut top: Vec<&str> = sample.as_object().unwrap().keys().map(String::as_str).collect();
        let mut declared = required(&schema);
        top.sort();
        declared.sort();
        assert_eq!(top, declared);

        let ing_schema = &schema["properties"]["dishes"]["items"]["properties"]["ingredients"]["items"];
        let ing = &sample["dishes"][0]["ingredients"][0];
        let mut ing_keys: Vec<&str> = ing.as_object().unwrap().keys().map(String::as_str).collect();
        let mut ing_declared = required(ing_schema);
        ing_keys.sort();
        ing_declared.sort();
        assert_eq!(ing_keys, ing_declared);
    }

    #[test]
    fn schema_is_closed() {
        let schema = plan_schema();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(
            schema["properties"]["commonIngredients"]["items"]["properties"]["prices"]["additionalProperties"],
            false
        );
    }
}
