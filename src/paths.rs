use std::path::{Path, PathBuf};

/// Resolves the agent's filesystem layout (§6): a configuration directory
/// (user document, cached remote config, signing keys), a data directory
/// (per-attempt Collector working directories, GeneratedConfig history) and
/// a log directory. All paths are overridable; these are just the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Paths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/nrdot-host"),
            data_dir: PathBuf::from("/var/lib/nrdot-host"),
            log_dir: PathBuf::from("/var/log/nrdot-host"),
        }
    }
}

impl Paths {
    pub fn new(config_dir: PathBuf, data_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
            log_dir,
        }
    }

    pub fn user_config_file(&self) -> PathBuf {
        self.config_dir.join("config.yaml")
    }

    pub fn remote_config_cache_file(&self) -> PathBuf {
        self.data_dir.join("remote_config.cache.json")
    }

    pub fn signing_key_file(&self) -> PathBuf {
        self.config_dir.join("signing_key.pem")
    }

    pub fn host_id_file(&self) -> PathBuf {
        self.data_dir.join("host_id")
    }

    pub fn collector_working_dir(&self, attempt_id: &str) -> PathBuf {
        self.data_dir.join("collector").join(attempt_id)
    }

    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join("history")
    }

    pub fn helper_socket(&self) -> PathBuf {
        Path::new("/run/nrdot-host").join("helper.sock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_well_formed() {
        let paths = Paths::default();
        assert_eq!(paths.user_config_file(), PathBuf::from("/etc/nrdot-host/config.yaml"));
        assert_eq!(
            paths.collector_working_dir("attempt-1"),
            PathBuf::from("/var/lib/nrdot-host/collector/attempt-1")
        );
    }
}
