//! Saved plans, persisted write-through as one JSON array under a fixed key.
//!
//! The collection is ordered newest first. Every mutation rewrites the whole
//! array; when that write fails the in-memory change is kept and the caller
//! gets a [`PersistenceError`], so memory and storage may diverge.

pub mod storage;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::plan::{Plan, SavedPlan};
use crate::telemetry;
use crate::telemetry::ops::bookmarks::Phase as BookmarkPhase;

pub use storage::{FileStore, KvStore, MemoryStore, StorageError};

pub const STORAGE_KEY: &str = "hk_chef_bookmarks";

/// Key deciding whether two plans are "the same" bookmark.
///
/// Only the first dish name and the portion size are compared, so distinct
/// plans starting with the same dish at the same size collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookmarkKey {
    pub first_dish: Option<String>,
    pub portion_size: u32,
}

pub fn bookmark_key(plan: &Plan) -> BookmarkKey {
    BookmarkKey {
        first_dish: plan.first_dish_name().map(str::to_string),
        portion_size: plan.portion_size,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum Toggled {
    Added(String),
    Removed(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("bookmarks changed in memory but were not saved: {0}")]
    Write(#[from] StorageError),
    #[error("bookmarks could not be serialized: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct BookmarkStore<S> {
    storage: S,
    entries: Vec<SavedPlan>,
}

impl<S: KvStore> BookmarkStore<S> {
    /// Read the persisted collection. Missing or unreadable data yields an
    /// empty store.
    pub fn load(storage: S) -> Self {
        let log = telemetry::bookmarks();
        let _g = log.span(&BookmarkPhase::Load).entered();

        let entries = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<SavedPlan>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    log.warn_kv("discarding corrupt bookmarks", [("error", e.to_string())]);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log.warn_kv("bookmarks unreadable", [("error", e.to_string())]);
                Vec::new()
            }
        };
        log.debug_kv("bookmarks loaded", [("count", entries.len().to_string())]);
        Self { storage, entries }
    }

    pub fn is_saved(&self, plan: &Plan) -> bool {
        self.position_of(plan).is_some()
    }

    /// Remove the matching bookmark, or save `plan` as a new one at the front.
    pub fn toggle(&mut self, plan: &Plan, original_query: &str) -> Result<Toggled, PersistenceError> {
        let log = telemetry::bookmarks();
        let _g = log.span(&BookmarkPhase::Toggle).entered();

        let outcome = match self.position_of(plan) {
            Some(index) => Toggled::Removed(self.entries.remove(index).id),
            None => {
                let saved = SavedPlan {
                    id: new_bookmark_id(),
                    original_query: original_query.to_string(),
                    created_at: Utc::now().timestamp_millis(),
                    plan: plan.clone(),
                };
                let id = saved.id.clone();
                self.entries.insert(0, saved);
                Toggled::Added(id)
            }
        };
        log.info_kv("bookmark toggled", [("outcome", format!("{outcome:?}"))]);
        self.persist()?;
        Ok(outcome)
    }

    /// Delete by id. Returns `false` (and writes nothing) for unknown ids.
    pub fn remove(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let log = telemetry::bookmarks();
        let _g = log.span(&BookmarkPhase::Remove).entered();

        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            log.debug_kv("no bookmark to remove", [("id", id.to_string())]);
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Newest first.
    pub fn list(&self) -> &[SavedPlan] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&SavedPlan> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The bookmark `plan` is considered the same as, if any.
    pub fn find(&self, plan: &Plan) -> Option<&SavedPlan> {
        self.position_of(plan).map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position_of(&self, plan: &Plan) -> Option<usize> {
        let key = bookmark_key(plan);
        self.entries.iter().position(|e| bookmark_key(&e.plan) == key)
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        let log = telemetry::bookmarks();
        let _g = log.span(&BookmarkPhase::Persist).entered();

        let raw = serde_json::to_string(&self.entries)?;
        if let Err(e) = self.storage.set(STORAGE_KEY, &raw) {
            log.warn_kv("bookmark write failed", [("error", e.to_string())]);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Time-ordered, unique within and across processes.
fn new_bookmark_id() -> String {
    Uuid::now_v7().to_string()
}
