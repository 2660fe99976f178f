use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::Instrument;

use crate::bookmarks::{BookmarkStore, FileStore, KvStore, Toggled};
use crate::config::ChefConfig;
use crate::generate::{LlmPlanGenerator, PlanGenerator, prompt};
use crate::llm::openai::OpenAiClientConfig;
use crate::output::types::Meta;
use crate::plan::Plan;
use crate::session::PlanSession;
use crate::telemetry::{self};
use crate::telemetry::ops::cook::Phase as CookPhase;

pub mod render;
pub mod types;

use types::{CookPlan, CookResult};

pub const MAX_PEOPLE: u32 = 20;

/// chef cook "蒸魚, 炒菜" --people 4
#[derive(Args, Debug)]
pub struct CookCmd {
    /// Dish description, several dishes separated by commas
    pub dish: String,
    /// Household size (1-20)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_PEOPLE as i64))]
    pub people: u32,
    /// Bookmark the generated plan unless an equivalent one is already saved
    #[arg(long, default_value_t = false)]
    pub save: bool,
    /// Print the request that would be sent; no service call
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

pub async fn run(cfg: &ChefConfig, args: CookCmd) -> Result<()> {
    let log = telemetry::cook();
    let root = log.root_span_kv([
        ("people", args.people.to_string()),
        ("language", cfg.language.to_string()),
        ("save", args.save.to_string()),
        ("dry_run", args.dry_run.to_string()),
        ("json", telemetry::config::json_mode().to_string()),
    ]);
    cook(cfg, args).instrument(root).await
}

async fn cook(cfg: &ChefConfig, args: CookCmd) -> Result<()> {
    let log = telemetry::cook();
    let t0 = Instant::now();

    if args.dry_run {
        let _s = log.span(&CookPhase::Prepare).entered();
        let model = OpenAiClientConfig::from_env().default_model;
        let request = prompt::build_request(args.people, &args.dish, cfg.language, Some(&model));
        let plan = CookPlan::from_request(&request, args.people, &args.dish, cfg.language, args.save);
        if telemetry::config::json_mode() {
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 Would ask {} for {} ({} people, {})", model, args.dish, args.people, cfg.language));
            for m in &plan.messages {
                log.info(format!("[{}] {}", m.role, m.content));
            }
        }
        return Ok(());
    }

    let generator = LlmPlanGenerator::from_env().context("init plan generator")?;
    let session = PlanSession::new(generator, cfg.language);
    let plan = generate(&session, args.people, &args.dish).await?;

    let bookmark_id = if args.save {
        let _s = log.span(&CookPhase::Save).entered();
        let mut store = BookmarkStore::load(FileStore::new(&cfg.data_dir));
        Some(save_once(&mut store, &plan, &args.dish)?)
    } else {
        None
    };

    let _out = log.span(&CookPhase::Output).entered();
    if telemetry::config::json_mode() {
        let result = CookResult {
            title: plan.title(),
            language: cfg.language,
            dish_description: &args.dish,
            estimated_cost: plan.estimated_cost(),
            bookmark_id,
            plan: &plan,
        };
        log.result(&result, Some(Meta { duration_ms: Some(t0.elapsed().as_millis()) }))?;
    } else {
        for line in render::plan_lines(&plan) {
            log.info(line);
        }
        if let Some(id) = bookmark_id {
            log.info(format!("🔖 Saved as {id}"));
        }
    }
    Ok(())
}

async fn generate<G: PlanGenerator>(session: &PlanSession<G>, people: u32, dish: &str) -> Result<Plan> {
    let log = telemetry::cook();
    let plan = session
        .submit(people, dish)
        .instrument(log.span(&CookPhase::Generate))
        .await?;
    Ok(plan)
}

/// Bookmark `plan` unless an equivalent bookmark exists; returns its id.
pub(crate) fn save_once<S: KvStore>(store: &mut BookmarkStore<S>, plan: &Plan, original_query: &str) -> Result<String> {
    if let Some(existing) = store.find(plan) {
        telemetry::cook().info_kv("already saved", [("id", existing.id.clone())]);
        return Ok(existing.id.clone());
    }
    match store
        .toggle(plan, original_query)
        .context("bookmark could not be written")?
    {
        Toggled::Added(id) => Ok(id),
        Toggled::Removed(id) => anyhow::bail!("bookmark {id} was removed instead of saved"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::MemoryStore;
    use crate::plan::fixtures::plan;

    #[test]
    fn save_once_does_not_unsave() {
        let mut store = BookmarkStore::load(MemoryStore::new());
        let first = save_once(&mut store, &plan("蒸魚", 4), "蒸魚").unwrap();
        let again = save_once(&mut store, &plan("蒸魚", 4), "蒸魚").unwrap();
        assert_eq!(first, again);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn dry_run_plan_carries_messages_and_schema() {
        let request = prompt::build_request(4, "蒸魚", crate::generate::Language::English, Some("m"));
        let plan = CookPlan::from_request(&request, 4, "蒸魚", crate::generate::Language::English, false);
        let v = serde_json::to_value(&plan).unwrap();
        assert_eq!(v["model"], "m");
        assert_eq!(v["language"], "en");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["role"], "user");
        assert!(v["messages"][1]["content"].as_str().unwrap().contains("蒸魚"));
        assert_eq!(v["schema"]["type"], "object");
    }
}
