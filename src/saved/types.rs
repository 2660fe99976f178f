use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::plan::{CostEstimate, Plan, SavedPlan};
use crate::util::time::from_millis;

#[derive(Serialize)]
pub struct SavedRow {
    pub id: String,
    pub title: String,
    pub portion_size: u32,
    pub original_query: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&SavedPlan> for SavedRow {
    fn from(s: &SavedPlan) -> Self {
        Self {
            id: s.id.clone(),
            title: s.plan.title(),
            portion_size: s.plan.portion_size,
            original_query: s.original_query.clone(),
            created_at: from_millis(s.created_at),
        }
    }
}

#[derive(Serialize)]
pub struct SavedList {
    pub count: usize,
    pub bookmarks: Vec<SavedRow>,
}

#[derive(Serialize)]
pub struct SavedRemoveResult {
    pub id: String,
    pub removed: bool,
}

#[derive(Serialize)]
pub struct SavedRescaleResult<'a> {
    pub from_id: &'a str,
    pub from_size: u32,
    pub title: String,
    pub estimated_cost: CostEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<String>,
    pub plan: &'a Plan,
}
