//! Application settings: plan language and data directory.
//!
//! Resolution chain: CLI flag > env var > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::generate::Language;

const APP_DIR: &str = "hk-chef";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChefConfig {
    pub language: Language,
    pub data_dir: PathBuf,
}

/// Raw values read from the environment.
#[derive(Debug, Default, Clone)]
struct EnvValues {
    language: Option<String>,
    data_dir: Option<String>,
    xdg_data_home: Option<String>,
}

impl EnvValues {
    fn read() -> Self {
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        Self {
            language: var("CHEF_LANGUAGE"),
            data_dir: var("CHEF_DATA_DIR"),
            xdg_data_home: var("XDG_DATA_HOME"),
        }
    }
}

impl ChefConfig {
    pub fn resolve(cli_lang: Option<Language>, cli_data_dir: Option<&Path>) -> Result<Self> {
        Self::resolve_from(cli_lang, cli_data_dir, EnvValues::read())
    }

    fn resolve_from(cli_lang: Option<Language>, cli_data_dir: Option<&Path>, env: EnvValues) -> Result<Self> {
        let language = match (cli_lang, env.language) {
            (Some(lang), _) => lang,
            (None, Some(raw)) => raw
                .parse()
                .with_context(|| format!("CHEF_LANGUAGE is not a supported language: {raw}"))?,
            (None, None) => Language::default(),
        };

        let data_dir = if let Some(dir) = cli_data_dir {
            dir.to_path_buf()
        } else if let Some(dir) = env.data_dir {
            PathBuf::from(dir)
        } else {
            default_data_dir(env.xdg_data_home.as_deref())
        };

        Ok(Self { language, data_dir })
    }
}

/// `$XDG_DATA_HOME/hk-chef`, else the platform data dir, else `./.hk-chef`.
fn default_data_dir(xdg_data_home: Option<&str>) -> PathBuf {
    if let Some(xdg) = xdg_data_home {
        return PathBuf::from(xdg).join(APP_DIR);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{APP_DIR}")))
}
