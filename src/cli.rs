// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lb")]
#[command(version)]
#[command(about = "Simple round-robin HTTP load balancer")]
#[command(long_about = "
Forwards every request to the next healthy backend and probes the backends
in the background.

Settings come from an optional YAML/JSON file, overridden by environment
variables (ADDRESS, BACKEND_URLS, HEALTH_CHECK_PATH,
HEALTH_CHECK_INTERVAL_SECONDS, ...).

Example usage:
  BACKEND_URLS=http://10.0.0.1:8080,http://10.0.0.2:8080 lb -v
  lb config.yaml
")]
pub struct Cli {
    /// Path to a YAML or JSON config file
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v switches the default level to debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl Cli {
    pub fn debug_logging(&self) -> bool {
        self.verbosity > 0
    }
}
