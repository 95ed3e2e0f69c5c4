use std::path::PathBuf;

use p256::ecdsa::VerifyingKey;

use crate::generator::generated_config::GeneratedConfig;
use crate::generator::signer;
use crate::paths::Paths;
use crate::supervisor::error::SupervisorError;
use crate::utils::fs::write_atomic;

/// The steps of §4.6's blue-green swap, named so each is independently
/// observable in logs and tests. `Failed` carries the step that produced
/// it, not a duplicate of the error itself (the error is returned
/// alongside).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapPhase {
    ResolvingEnv,
    Rendering,
    LaunchingCandidate,
    PollingHealth,
    Swapping,
    Draining,
    Done,
    Failed,
}

/// Checks every name in `required_env` against the process environment.
/// Returns the missing subset (empty means all present), sorted so the
/// error message and tests are stable.
pub fn missing_env_vars(required: &[String]) -> Vec<String> {
    let mut missing: Vec<String> = required
        .iter()
        .filter(|name| std::env::var(name).is_err())
        .cloned()
        .collect();
    missing.sort();
    missing
}

/// Step 1 of the swap: fail fast with `MissingEnv` before anything is
/// rendered or launched.
pub fn resolve_env(config: &GeneratedConfig) -> Result<(), SupervisorError> {
    let missing = missing_env_vars(&config.required_env);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SupervisorError::MissingEnv(missing))
    }
}

/// Verifies `config`'s signature against `verifying_key` when one is
/// configured. `None` means signature verification is disabled, in which
/// case unsigned (or differently signed) configs are accepted per §4.4.
pub fn verify_signature(
    verifying_key: Option<&VerifyingKey>,
    config: &GeneratedConfig,
) -> Result<(), SupervisorError> {
    let Some(key) = verifying_key else {
        return Ok(());
    };
    if signer::verify(key, config.rendered.as_bytes(), &config.signature) {
        Ok(())
    } else {
        Err(SupervisorError::SignatureInvalid)
    }
}

/// Step 2: renders the candidate's config file into a fresh, never-reused
/// working directory and returns the path to the rendered file.
pub fn render_candidate(
    paths: &Paths,
    attempt_id: &str,
    config: &GeneratedConfig,
) -> Result<PathBuf, SupervisorError> {
    let working_dir = paths.collector_working_dir(attempt_id);
    let config_path = working_dir.join("config.yaml");
    write_atomic(&config_path, config.rendered.as_bytes())
        .map_err(|err| SupervisorError::RenderFailed(err.to_string()))?;
    Ok(config_path)
}

/// Derives a health address for the candidate that is distinct from the
/// currently active one, so the candidate can be polled without routing
/// any real traffic to it yet (§4.6 step 3).
pub fn candidate_health_address(base_host: &str, base_port: u16, attempt: u32) -> String {
    format!("{base_host}:{}", base_port + 1 + (attempt % 1000) as u16)
}
