use serde::{Deserialize, Serialize};

use crate::config::fragments::RenderedDocument;
use crate::config::version::ConfigVersion;

/// A fully rendered, signed Collector configuration, ready to hand to the
/// supervisor. Carries both the structured [`RenderedDocument`] (for
/// [`crate::config::diff`]) and the exact rendered YAML bytes that were
/// hashed and signed — the two must never drift apart, which is why only
/// [`crate::generator::generator::ConfigGenerator::generate`] constructs
/// this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedConfig {
    pub version: ConfigVersion,
    pub source_snapshot_id: u64,
    pub fragments: RenderedDocument,
    pub rendered: String,
    pub content_hash: String,
    pub signature: String,
    pub required_env: Vec<String>,
}
