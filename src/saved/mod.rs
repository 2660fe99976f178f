use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use tracing::Instrument;

use crate::bookmarks::{BookmarkStore, FileStore, KvStore};
use crate::config::ChefConfig;
use crate::cook::{MAX_PEOPLE, render, save_once};
use crate::generate::{LlmPlanGenerator, PlanGenerator};
use crate::output::types::Meta;
use crate::session::PlanSession;
use crate::telemetry::{self};
use crate::telemetry::ops::saved::Phase as SavedPhase;
use crate::util::time::format_millis;

pub mod types;

use types::{SavedList, SavedRemoveResult, SavedRescaleResult, SavedRow};

/// chef saved ls/show/rm/rescale
#[derive(Args, Debug)]
pub struct SavedCmd {
    #[command(subcommand)]
    pub cmd: SavedSub,
}

#[derive(Subcommand, Debug)]
pub enum SavedSub {
    // list bookmarks, newest first
    Ls,
    // print one bookmarked plan
    Show { id: String },
    // delete a bookmark; unknown ids are reported, not an error
    Rm { id: String },
    // regenerate a bookmarked plan for another household size
    Rescale {
        id: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_PEOPLE as i64))]
        people: u32,
        #[arg(long, default_value_t = false)]
        save: bool,
    },
}

pub async fn run(cfg: &ChefConfig, args: SavedCmd) -> Result<()> {
    let log = telemetry::saved();
    let root = log.root_span_kv([
        ("data_dir", cfg.data_dir.display().to_string()),
        ("json", telemetry::config::json_mode().to_string()),
    ]);
    dispatch(cfg, args.cmd).instrument(root).await
}

async fn dispatch(cfg: &ChefConfig, cmd: SavedSub) -> Result<()> {
    let mut store = BookmarkStore::load(FileStore::new(&cfg.data_dir));
    match cmd {
        SavedSub::Ls => list(&store),
        SavedSub::Show { id } => show(&store, &id),
        SavedSub::Rm { id } => remove(&mut store, &id),
        SavedSub::Rescale { id, people, save } => {
            let generator = LlmPlanGenerator::from_env().context("init plan generator")?;
            let session = PlanSession::new(generator, cfg.language);
            rescale(&mut store, &session, &id, people, save).await
        }
    }
}

fn list<S: KvStore>(store: &BookmarkStore<S>) -> Result<()> {
    let log = telemetry::saved();
    let _s = log.span(&SavedPhase::List).entered();
    if telemetry::config::json_mode() {
        let out = SavedList {
            count: store.len(),
            bookmarks: store.list().iter().map(SavedRow::from).collect(),
        };
        log.result(&out, None)?;
        return Ok(());
    }
    if store.is_empty() {
        log.info("ℹ️  No saved plans");
        return Ok(());
    }
    log.info(format!("🔖 Saved plans ({}):", store.len()));
    for s in store.list() {
        log.info(format!(
            "{}  {}  serves {}  {}  ({})",
            s.id,
            format_millis(s.created_at),
            s.plan.portion_size,
            s.plan.title(),
            s.original_query
        ));
    }
    Ok(())
}

fn show<S: KvStore>(store: &BookmarkStore<S>, id: &str) -> Result<()> {
    let log = telemetry::saved();
    let _s = log.span(&SavedPhase::Show).entered();
    let Some(saved) = store.get(id) else { bail!("no saved plan with id {id}") };
    if telemetry::config::json_mode() {
        log.result(saved, None)?;
    } else {
        log.info(format!("🔖 {}  saved {}  for \"{}\"", saved.id, format_millis(saved.created_at), saved.original_query));
        for line in render::plan_lines(&saved.plan) {
            log.info(line);
        }
    }
    Ok(())
}

fn remove<S: KvStore>(store: &mut BookmarkStore<S>, id: &str) -> Result<()> {
    let log = telemetry::saved();
    let _s = log.span(&SavedPhase::Remove).entered();
    let removed = store.remove(id).context("bookmark removal could not be written")?;
    if telemetry::config::json_mode() {
        log.result(&SavedRemoveResult { id: id.to_string(), removed }, None)?;
    } else if removed {
        log.info(format!("🗑️  Removed {id}"));
    } else {
        log.info(format!("ℹ️  No saved plan with id {id}"));
    }
    Ok(())
}

async fn rescale<S: KvStore, G: PlanGenerator>(
    store: &mut BookmarkStore<S>,
    session: &PlanSession<G>,
    id: &str,
    people: u32,
    save: bool,
) -> Result<()> {
    let log = telemetry::saved();
    let t0 = Instant::now();
    let Some(saved) = store.get(id).cloned() else { bail!("no saved plan with id {id}") };

    session.open_saved(&saved)?;
    let plan = session
        .rescale(people)
        .instrument(log.span(&SavedPhase::Rescale))
        .await?;

    let bookmark_id = if save {
        Some(save_once(store, &plan, &saved.original_query)?)
    } else {
        None
    };

    if telemetry::config::json_mode() {
        let out = SavedRescaleResult {
            from_id: &saved.id,
            from_size: saved.plan.portion_size,
            title: plan.title(),
            estimated_cost: plan.estimated_cost(),
            bookmark_id,
            plan: &plan,
        };
        log.result(&out, Some(Meta { duration_ms: Some(t0.elapsed().as_millis()) }))?;
    } else {
        log.info(format!("📐 Rescaled {} from {} to {}", saved.id, saved.plan.portion_size, plan.portion_size));
        for line in render::plan_lines(&plan) {
            log.info(line);
        }
        if let Some(id) = bookmark_id {
            log.info(format!("🔖 Saved as {id}"));
        }
    }
    Ok(())
}
