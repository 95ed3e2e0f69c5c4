//! Command line interface (§6): parses arguments and decides which verb to
//! run. Business logic for each verb delegates to the Engine/Discovery/
//! Supervisor/API modules already specified elsewhere in the crate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// In which mode the agent's background loop runs.
#[derive(Debug, Clone, Copy, clap::ValueEnum, PartialEq, Eq)]
pub enum RunMode {
    /// Auto-configuration loop, Supervisor, and Control API.
    All,
    /// Auto-configuration loop and Supervisor only, no Control API.
    Agent,
    /// Control API only, against an already-running agent's state directory.
    Api,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch in the selected mode.
    Run {
        #[arg(long, value_enum, default_value = "all")]
        mode: RunMode,
    },
    /// Query the local Control API for aggregated status.
    Status {
        #[arg(long, default_value = "http://127.0.0.1:8431")]
        api_base_url: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Force a `DiscoverySnapshot` and print it.
    Discover,
    /// Generate a candidate configuration without applying it.
    Preview,
    /// Validate a user document without side effects.
    Validate,
}

/// Command line arguments, as parsed by [`clap`].
#[derive(Debug, Parser)]
#[command(name = "nrdot-host", author, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Overrides the default configuration directory (`/etc/nrdot-host`).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Overrides the default data directory (`/var/lib/nrdot-host`).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Overrides the default log directory (`/var/log/nrdot-host`).
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults_to_all_mode() {
        let cli = Cli::parse_from(["nrdot-host", "run"]);
        assert!(matches!(cli.command, Command::Run { mode: RunMode::All }));
    }

    #[test]
    fn run_accepts_agent_mode() {
        let cli = Cli::parse_from(["nrdot-host", "run", "--mode", "agent"]);
        assert!(matches!(cli.command, Command::Run { mode: RunMode::Agent }));
    }

    #[test]
    fn validate_takes_no_arguments() {
        let cli = Cli::parse_from(["nrdot-host", "validate"]);
        assert!(matches!(cli.command, Command::Validate));
    }

    #[test]
    fn config_dir_override_is_parsed() {
        let cli = Cli::parse_from(["nrdot-host", "--config-dir", "/tmp/cfg", "discover"]);
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/cfg")));
    }
}
