pub mod generate;
pub mod bookmarks;
pub mod session;
pub mod cook;
pub mod saved;
