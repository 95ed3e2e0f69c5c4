use serde::{Deserialize, Serialize};

const LOGGING_ENABLED_CRATES: &[&str] = &["nrdot_host"];

/// Logging configuration driven by the user document's `logging.level` /
/// `logging.format` keys.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_level")]
    pub level: String,
    /// Overrides `level` and enables logs from any crate, not just
    /// [`LOGGING_ENABLED_CRATES`]. Insecure because dependency crates may
    /// log sensitive fields; off by default.
    #[serde(default)]
    pub insecure_fine_grained_level: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
            insecure_fine_grained_level: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LoggingConfig {
    /// Builds the `EnvFilter` directive string: fine-grained override wins
    /// outright; otherwise only the crate's own target is enabled at the
    /// configured level, everything else is silenced.
    pub fn filter_directive(&self) -> String {
        if let Some(fine_grained) = self
            .insecure_fine_grained_level
            .as_ref()
            .filter(|s| !s.is_empty())
        {
            return fine_grained.clone();
        }
        let mut directives: Vec<String> = LOGGING_ENABLED_CRATES
            .iter()
            .map(|crate_name| format!("{crate_name}={}", self.level))
            .collect();
        directives.push("off".to_string());
        directives.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_only_enables_own_crate() {
        let config = LoggingConfig::default();
        assert_eq!(config.filter_directive(), "nrdot_host=info,off");
    }

    #[test]
    fn fine_grained_override_replaces_directive() {
        let config = LoggingConfig {
            insecure_fine_grained_level: Some("nrdot_host=debug,reqwest=trace".to_string()),
            ..LoggingConfig::default()
        };
        assert_eq!(config.filter_directive(), "nrdot_host=debug,reqwest=trace");
    }

    #[test]
    fn empty_fine_grained_override_does_not_apply() {
        let config = LoggingConfig {
            insecure_fine_grained_level: Some(String::new()),
            level: "warn".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(config.filter_directive(), "nrdot_host=warn,off");
    }
}
