use std::sync::Arc;

use crate::config::render;
use crate::config::schema::UserConfig;
use crate::config::version::VersionCounter;
use crate::discovery::snapshot::DiscoverySnapshot;
use crate::generator::error::GeneratorError;
use crate::generator::generated_config::GeneratedConfig;
use crate::generator::signer::{content_hash, ConfigSigner};

/// Turns a discovery snapshot and the user's config into a signed,
/// ready-to-apply [`GeneratedConfig`]. Stateless apart from the version
/// counter, which it owns so every call produces a fresh, strictly
/// increasing version.
pub struct ConfigGenerator {
    signer: Arc<dyn ConfigSigner>,
    versions: VersionCounter,
}

impl ConfigGenerator {
    pub fn new(signer: Arc<dyn ConfigSigner>) -> Self {
        Self {
            signer,
            versions: VersionCounter::new(),
        }
    }

    pub fn generate(
        &self,
        user: &UserConfig,
        snapshot: &DiscoverySnapshot,
    ) -> Result<GeneratedConfig, GeneratorError> {
        let fragments = render::render(user, snapshot);
        if fragments.receivers.is_empty() {
            return Err(GeneratorError::EmptyDocument);
        }
        let rendered = fragments.to_yaml_string();
        let hash = content_hash(rendered.as_bytes());
        let signature = self.signer.sign(rendered.as_bytes())?;
        let required_env = render::required_env_vars(&fragments);

        Ok(GeneratedConfig {
            version: self.versions.next(),
            source_snapshot_id: snapshot.id,
            fragments,
            rendered,
            content_hash: hash,
            signature,
            required_env,
        })
    }
}
