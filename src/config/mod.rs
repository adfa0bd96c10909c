mod inventory;

pub use inventory::{read_puppetdb_hosts, read_switch_connect_options, PuppetDbHost, SwitchConnectOptions};

use std::env;
use std::path::{Path, PathBuf};

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub ssh_timeout_secs: u64,
    pub acquire_concurrency: usize,
    pub puppetdb_query_url: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            data_dir: PathBuf::from(get_env("DATA_DIR", "data")),
            ssh_timeout_secs: get_env("SSH_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            acquire_concurrency: get_env("ACQUIRE_CONCURRENCY", "8")
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(8),
            puppetdb_query_url: get_env(
                "PUPPETDB_QUERY_URL",
                "http://localhost:8080/pdb/query/v4/facts",
            ),
        }
    }

    /// Switch inventory (connection options per device)
    pub fn switches_inventory(&self) -> PathBuf {
        self.data_dir.join("switches.toml")
    }

    /// Fact-store inventory (hosts to query for facts)
    pub fn puppetdb_inventory(&self) -> PathBuf {
        self.data_dir.join("puppetdb.toml")
    }

    /// Directory holding one raw snapshot per switch
    pub fn switches_dir(&self) -> PathBuf {
        self.data_dir.join("switches")
    }

    /// Directory holding one document per fact kind per fact-store host
    pub fn facts_dir(&self) -> PathBuf {
        self.data_dir.join("puppetdb")
    }

    /// Directory holding optional host-side lldpcli captures
    pub fn lldpcli_dir(&self) -> PathBuf {
        self.data_dir.join("lldpcli")
    }

    pub fn with_data_dir(mut self, data_dir: &Path) -> Self {
        self.data_dir = data_dir.to_path_buf();
        self
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
