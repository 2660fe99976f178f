use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    pub fn from_env() -> Self {
        Self::from_values(
            env::var("CHEF_OUTPUT_FORMAT").ok().as_deref(),
            env::var("CHEF_OUTPUT_PRETTY").ok().as_deref(),
        )
    }

    fn from_values(format: Option<&str>, pretty: Option<&str>) -> Self {
        let format = match format {
            Some("text") => OutputFormat::Text,
            _ => OutputFormat::Json,
        };
        let pretty = matches!(
            pretty,
            Some(v) if v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
        );
        OutputConfig { format, pretty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_compact_json() {
        let cfg = OutputConfig::from_values(None, None);
        assert_eq!(cfg, OutputConfig { format: OutputFormat::Json, pretty: false });
    }

    #[test]
    fn reads_text_and_pretty_flags() {
        let cfg = OutputConfig::from_values(Some("text"), Some("YES"));
        assert_eq!(cfg.format, OutputFormat::Text);
        assert!(cfg.pretty);
        assert!(!OutputConfig::from_values(None, Some("0")).pretty);
    }
}
