use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use hk_chef::config::ChefConfig;
use hk_chef::generate::Language;
use hk_chef::{cook, saved, telemetry};

#[derive(Parser)]
#[command(name = "chef", about = "Hong Kong home-cooking shopping lists and recipes")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,
    /// Language of the generated plan (default: CHEF_LANGUAGE or zh-HK)
    #[arg(global = true, long, value_enum)]
    lang: Option<Language>,
    /// Where bookmarks are kept (default: CHEF_DATA_DIR or the user data dir)
    #[arg(global = true, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Cook(cook::CookCmd),
    Saved(saved::SavedCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // stderr logging; respects RUST_LOG and CHEF_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = ChefConfig::resolve(cli.lang, cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Cook(args) => cook::run(&cfg, args).await?,
        Commands::Saved(args) => saved::run(&cfg, args).await?,
    }

    Ok(())
}
