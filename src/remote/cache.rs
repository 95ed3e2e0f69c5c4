use std::path::Path;

use crate::remote::baseline::RemoteConfigResponse;
use crate::remote::error::RemoteConfigError;
use crate::utils::fs::write_atomic;

/// Persists the last-known-good remote response to disk so the agent has
/// something to fall back to across restarts if the remote config service
/// is unreachable on startup.
pub fn store(path: &Path, response: &RemoteConfigResponse) -> Result<(), RemoteConfigError> {
    let bytes = serde_json::to_vec_pretty(response)
        .map_err(|err| RemoteConfigError::Cache(err.to_string()))?;
    write_atomic(path, &bytes).map_err(|err| RemoteConfigError::Cache(err.to_string()))
}

/// Loads the cached response, if any. A missing cache file is not an
/// error — it just means there's nothing to fall back to yet.
pub fn load(path: &Path) -> Result<Option<RemoteConfigResponse>, RemoteConfigError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let response = serde_json::from_slice(&bytes)
                .map_err(|err| RemoteConfigError::Cache(err.to_string()))?;
            Ok(Some(response))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(RemoteConfigError::Cache(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("remote_config.cache.json");
        let response = RemoteConfigResponse::Updated {
            remote_config_version: 9,
            document: serde_json::json!({"license_key": "abc"}),
        };
        store(&path, &response).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded, response);
    }

    #[test]
    fn missing_cache_file_yields_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(load(&path).unwrap().is_none());
    }
}
