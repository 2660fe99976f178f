//! Shopping lists and cooking steps for Hong Kong households.
//!
//! [`generate`] asks a generative text service for a [`plan::Plan`] under a
//! fixed output schema, [`session::PlanSession`] tracks the active plan, and
//! [`bookmarks::BookmarkStore`] keeps saved plans on disk. `cook` and `saved`
//! are the `chef` binary's commands.

pub mod bookmarks;
pub mod config;
pub mod cook;
pub mod generate;
pub mod llm;
pub mod output;
pub mod plan;
pub mod saved;
pub mod session;
pub mod telemetry;
pub mod util;
