pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

// One typed context per operation; phases are checked at compile time.
pub fn generate() -> LogCtx<ops::generate::Generate> { LogCtx::new(config::logs_are_json()) }
pub fn bookmarks() -> LogCtx<ops::bookmarks::Bookmarks> { LogCtx::new(config::logs_are_json()) }
pub fn session() -> LogCtx<ops::session::Session> { LogCtx::new(config::logs_are_json()) }
pub fn cook() -> LogCtx<ops::cook::Cook> { LogCtx::new(config::logs_are_json()) }
pub fn saved() -> LogCtx<ops::saved::Saved> { LogCtx::new(config::logs_are_json()) }
