use std::path::Path;

use crate::utils::fs::write_atomic;

/// Loads the persisted host identifier used in every [`super::baseline::BaselineReport`],
/// generating and persisting a fresh one on first run. Stable across restarts
/// (unlike the config version or snapshot id) so the remote service can
/// recognize this host across agent restarts and reinstalls of the config
/// directory alone.
pub fn load_or_create_host_id(path: &Path) -> std::io::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents.trim().to_string()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let id = uuid::Uuid::new_v4().to_string();
            write_atomic(path, id.as_bytes())?;
            Ok(id)
        }
        Err(err) => Err(err),
    }
}

/// Best-effort hostname lookup for the baseline report. Falls back to
/// `"unknown"` rather than failing the discovery cycle over a cosmetic
/// field (§4.5 does not treat hostname resolution failure as fatal).
#[cfg(unix)]
pub fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(not(unix))]
pub fn hostname() -> String {
    "unknown".to_string()
}
