use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// The declarative user document. Immutable once loaded — a change implies
/// a fresh [`crate::config::version::ConfigVersion`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub license_key: String,

    #[serde(default)]
    pub service: ServiceIdentity,

    #[serde(default)]
    pub auto_config: AutoConfigSection,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceIdentity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoConfigSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(
        default = "default_scan_interval",
        deserialize_with = "duration_str::deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub scan_interval: Duration,

    #[serde(default)]
    pub exclude_services: HashSet<String>,

    #[serde(default)]
    pub service_overrides: HashMap<String, ServiceOverride>,
}

fn default_true() -> bool {
    true
}

fn default_scan_interval() -> Duration {
    DEFAULT_SCAN_INTERVAL
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl Default for AutoConfigSection {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            exclude_services: HashSet::new(),
            service_overrides: HashMap::new(),
        }
    }
}

/// A sparse, per-service-type override document. List fields replace
/// wholesale; scalar fields replace; unknown keys are rejected by
/// `deny_unknown_fields` at deserialization time (surfacing as
/// `InvalidConfig`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceOverride {
    #[serde(default)]
    pub collection_interval: Option<u64>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub extra_attributes: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    #[serde(default)]
    pub listen_address: Option<String>,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub rate_limit: Option<RateLimitSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenEntry {
    pub token: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Operator,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    #[serde(default)]
    pub key: RateLimitKey,
    pub burst: u32,
    pub refill_per_second: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitKey {
    #[default]
    RemoteAddress,
    TokenIdentity,
    Route,
}

/// A single field-level validation error: a dotted path plus a message.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// The result of [`validate`]: empty `errors` means the document is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Pure validation, never writes state.
pub fn validate(user: &UserConfig) -> ValidationReport {
    let mut errors = Vec::new();

    if user.license_key.trim().is_empty() {
        errors.push(FieldError {
            path: "license_key".to_string(),
            message: "must be non-empty".to_string(),
        });
    }

    if user.auto_config.scan_interval < MIN_SCAN_INTERVAL {
        errors.push(FieldError {
            path: "auto_config.scan_interval".to_string(),
            message: format!(
                "must be at least {} seconds",
                MIN_SCAN_INTERVAL.as_secs()
            ),
        });
    }

    for token in &user.api.auth.tokens {
        if token.token.trim().is_empty() {
            errors.push(FieldError {
                path: "api.auth.tokens[].token".to_string(),
                message: "must be non-empty".to_string(),
            });
        }
    }

    if let Some(rate_limit) = &user.api.rate_limit {
        if rate_limit.burst == 0 {
            errors.push(FieldError {
                path: "api.rate_limit.burst".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if rate_limit.refill_per_second <= 0.0 {
            errors.push(FieldError {
                path: "api.rate_limit.refill_per_second".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
    }

    ValidationReport { errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn minimal() -> UserConfig {
        UserConfig {
            license_key: "abc123".to_string(),
            service: ServiceIdentity::default(),
            auto_config: AutoConfigSection::default(),
            api: ApiSection::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn minimal_document_is_valid() {
        assert!(validate(&minimal()).is_valid());
    }

    #[test]
    fn empty_license_key_is_invalid() {
        let mut user = minimal();
        user.license_key = String::new();
        let report = validate(&user);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "license_key");
    }

    #[rstest]
    #[case(29)]
    #[case(1)]
    fn scan_interval_below_minimum_is_invalid(#[case] secs: u64) {
        let mut user = minimal();
        user.auto_config.scan_interval = Duration::from_secs(secs);
        let report = validate(&user);
        assert!(report
            .errors
            .iter()
            .any(|e| e.path == "auto_config.scan_interval"));
    }

    #[test]
    fn unknown_top_level_key_fails_to_parse() {
        let yaml = "license_key: abc\nbogus_key: true\n";
        let err = serde_yaml::from_str::<UserConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("bogus_key"));
    }

    #[test]
    fn unknown_service_override_key_fails_to_parse() {
        let yaml = "license_key: abc\nauto_config:\n  service_overrides:\n    mysql:\n      bogus_key: 1\n";
        let err = serde_yaml::from_str::<UserConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("bogus_key"));
    }

    #[test]
    fn default_scan_interval_is_five_minutes() {
        assert_eq!(AutoConfigSection::default().scan_interval, Duration::from_secs(300));
    }
}
