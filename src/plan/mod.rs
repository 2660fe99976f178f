//! Recipe plan data model shared by generation, bookmarks and the session.

pub mod schema;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Advisory price pair in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceInfo {
    pub market: u32,
    pub supermarket: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    /// Wet-market phrasing, e.g. 半斤 or 4兩.
    pub market_quantity: String,
    /// Metric phrasing, e.g. 300g or 1 pack.
    pub supermarket_quantity: String,
    pub prices: PriceInfo,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    /// Execution order.
    pub cooking_steps: Vec<String>,
}

/// One generation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub dishes: Vec<Dish>,
    pub common_ingredients: Vec<Ingredient>,
    /// Household size the plan was computed for.
    pub portion_size: u32,
    pub shopping_tips: Vec<String>,
    pub waste_prevention_tip: String,
}

/// A bookmarked plan. Only the bookmark store creates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub id: String,
    pub original_query: String,
    /// Epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(flatten)]
    pub plan: Plan,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("plan contains no dishes")]
    NoDishes,
    #[error("dish #{index} has an empty name")]
    UnnamedDish { index: usize },
    #[error("plan lists no ingredients")]
    NoIngredients,
    #[error("portion size must be positive")]
    ZeroPortion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CostEstimate {
    pub market: u64,
    pub supermarket: u64,
}

impl Plan {
    /// Reject payloads that parse but cannot be shown as a plan.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        if self.dishes.is_empty() {
            return Err(SchemaViolation::NoDishes);
        }
        if let Some(index) = self.dishes.iter().position(|d| d.name.trim().is_empty()) {
            return Err(SchemaViolation::UnnamedDish { index });
        }
        if self.ingredient_count() == 0 {
            return Err(SchemaViolation::NoIngredients);
        }
        if self.portion_size == 0 {
            return Err(SchemaViolation::ZeroPortion);
        }
        Ok(())
    }

    pub fn first_dish_name(&self) -> Option<&str> {
        self.dishes.first().map(|d| d.name.as_str())
    }

    /// Dish names joined for list labels, e.g. "蒸魚 & 炒菜".
    pub fn title(&self) -> String {
        self.dishes
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(" & ")
    }

    pub fn ingredient_count(&self) -> usize {
        self.dishes.iter().map(|d| d.ingredients.len()).sum::<usize>()
            + self.common_ingredients.len()
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.dishes
            .iter()
            .flat_map(|d| d.ingredients.iter())
            .chain(self.common_ingredients.iter())
    }

    pub fn estimated_cost(&self) -> CostEstimate {
        self.ingredients().fold(CostEstimate::default(), |acc, ing| CostEstimate {
            market: acc.market + u64::from(ing.prices.market),
            supermarket: acc.supermarket + u64::from(ing.prices.supermarket),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn ingredient(name: &str, market: u32, supermarket: u32) -> Ingredient {
        Ingredient {
            name: name.to_string(),
            market_quantity: "半斤".to_string(),
            supermarket_quantity: "300g".to_string(),
            prices: PriceInfo { market, supermarket },
            notes: String::new(),
        }
    }

    pub fn dish(name: &str, ingredients: Vec<Ingredient>) -> Dish {
        Dish {
            name: name.to_string(),
            ingredients,
            cooking_steps: vec!["Prepare".to_string(), "Cook".to_string()],
        }
    }

    pub fn plan(first_dish: &str, portion_size: u32) -> Plan {
        Plan {
            dishes: vec![dish(first_dish, vec![ingredient("ginger", 5, 8)])],
            common_ingredients: vec![],
            portion_size,
            shopping_tips: vec!["Go early".to_string()],
            waste_prevention_tip: "Freeze leftovers".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn parses_camel_case_payload() {
        let raw = r#"{
            "dishes": [{
                "name": "蒸魚",
                "ingredients": [{
                    "name": "石斑",
                    "marketQuantity": "1條",
                    "supermarketQuantity": "600g",
                    "prices": {"market": 120, "supermarket": 98},
                    "notes": ""
                }],
                "cookingSteps": ["洗淨", "蒸8分鐘"]
            }],
            "commonIngredients": [],
            "portionSize": 3,
            "shoppingTips": [],
            "wastePreventionTip": "魚骨可煲湯"
        }"#;
        let plan: Plan = serde_json::from_str(raw).unwrap();
        assert_eq!(plan.portion_size, 3);
        assert_eq!(plan.dishes[0].ingredients[0].prices.market, 120);
        assert_eq!(plan.dishes[0].cooking_steps[1], "蒸8分鐘");
        plan.validate().unwrap();
    }

    #[test]
    fn negative_or_fractional_prices_do_not_parse() {
        for price in ["-1", "12.5"] {
            let raw = format!(
                r#"{{"name":"x","marketQuantity":"1","supermarketQuantity":"1","prices":{{"market":{price},"supermarket":1}},"notes":""}}"#
            );
            assert!(serde_json::from_str::<Ingredient>(&raw).is_err(), "{price} accepted");
        }
    }

    #[test]
    fn missing_notes_defaults_to_empty() {
        let raw = r#"{"name":"rice","marketQuantity":"1斤","supermarketQuantity":"1kg","prices":{"market":10,"supermarket":12}}"#;
        let ing: Ingredient = serde_json::from_str(raw).unwrap();
        assert!(ing.notes.is_empty());
    }

    #[test]
    fn validate_rejects_empty_plans() {
        let mut p = plan("蒸魚", 2);
        p.dishes.clear();
        assert_eq!(p.validate(), Err(SchemaViolation::NoDishes));

        let mut p = plan("  ", 2);
        assert_eq!(p.validate(), Err(SchemaViolation::UnnamedDish { index: 0 }));

        p.dishes[0].name = "炒菜".into();
        p.dishes[0].ingredients.clear();
        assert_eq!(p.validate(), Err(SchemaViolation::NoIngredients));

        p.common_ingredients.push(ingredient("rice", 30, 35));
        assert_eq!(p.validate(), Ok(()));

        p.portion_size = 0;
        assert_eq!(p.validate(), Err(SchemaViolation::ZeroPortion));
    }

    #[test]
    fn title_and_cost_cover_all_dishes() {
        let mut p = plan("蒸魚", 4);
        p.dishes.push(dish("炒菜", vec![ingredient("choi sum", 10, 14)]));
        p.common_ingredients.push(ingredient("rice", 30, 35));

        assert_eq!(p.title(), "蒸魚 & 炒菜");
        assert_eq!(p.ingredient_count(), 3);
        assert_eq!(
            p.estimated_cost(),
            CostEstimate { market: 45, supermarket: 57 }
        );
    }

    #[test]
    fn saved_plan_flattens_plan_fields() {
        let saved = SavedPlan {
            id: "abc".into(),
            original_query: "蒸魚".into(),
            created_at: 1_700_000_000_000,
            plan: plan("蒸魚", 2),
        };
        let value = serde_json::to_value(&saved).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["originalQuery"], "蒸魚");
        assert_eq!(value["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(value["portionSize"], 2);
        assert!(value.get("plan").is_none());
    }
}
