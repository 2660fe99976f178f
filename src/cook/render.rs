//! Human-readable plan summary for text mode.

use crate::plan::{Ingredient, Plan};

fn ingredient_line(ing: &Ingredient) -> String {
    let mut line = format!(
        "  • {}  {} / {}  (${} / ${})",
        ing.name, ing.market_quantity, ing.supermarket_quantity, ing.prices.market, ing.prices.supermarket
    );
    if !ing.notes.trim().is_empty() {
        line.push_str(&format!("  [{}]", ing.notes.trim()));
    }
    line
}

pub fn plan_lines(plan: &Plan) -> Vec<String> {
    let mut lines = vec![format!("🍽  {}  (serves {})", plan.title(), plan.portion_size)];

    for dish in &plan.dishes {
        lines.push(format!("🥢 {}", dish.name));
        lines.extend(dish.ingredients.iter().map(ingredient_line));
        for (i, step) in dish.cooking_steps.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, step));
        }
    }

    if !plan.common_ingredients.is_empty() {
        lines.push("🧂 Common ingredients:".to_string());
        lines.extend(plan.common_ingredients.iter().map(ingredient_line));
    }

    if !plan.shopping_tips.is_empty() {
        lines.push("🛒 Shopping tips:".to_string());
        lines.extend(plan.shopping_tips.iter().map(|t| format!("  - {t}")));
    }
    if !plan.waste_prevention_tip.trim().is_empty() {
        lines.push(format!("♻️  {}", plan.waste_prevention_tip));
    }

    let cost = plan.estimated_cost();
    lines.push(format!(
        "💰 Estimated cost: market ${}  supermarket ${}",
        cost.market, cost.supermarket
    ));
    lines
}
