use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output language for every free-text field of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Language {
    #[serde(rename = "en")]
    #[value(name = "en")]
    English,
    #[default]
    #[serde(rename = "zh-HK")]
    #[value(name = "zh-HK")]
    TraditionalChineseHk,
    #[serde(rename = "zh-CN")]
    #[value(name = "zh-CN")]
    SimplifiedChinese,
}

impl Language {
    pub const ALL: [Language; 3] = [
        Language::English,
        Language::TraditionalChineseHk,
        Language::SimplifiedChinese,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::TraditionalChineseHk => "zh-HK",
            Language::SimplifiedChinese => "zh-CN",
        }
    }

    /// Name used inside the generation prompt.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::TraditionalChineseHk => "Traditional Chinese (HK)",
            Language::SimplifiedChinese => "Simplified Chinese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language '{0}' (expected en, zh-HK or zh-CN)")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
