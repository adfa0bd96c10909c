use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::DeviceFamily;

/// Connection options for one switch, one table per device in switches.toml
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchConnectOptions {
    #[serde(skip)]
    pub device_name: String,
    pub device_type: DeviceFamily,
    #[serde(default)]
    pub device_type_flavor: String,
    #[serde(default)]
    pub ip: Option<String>,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
}

impl SwitchConnectOptions {
    /// Address to connect to, falling back to the device name
    pub fn host(&self) -> &str {
        self.ip.as_deref().unwrap_or(&self.device_name)
    }
}

/// A fact-store host reached over SSH, one table per host in puppetdb.toml
#[derive(Debug, Clone, Deserialize)]
pub struct PuppetDbHost {
    #[serde(skip)]
    pub host: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
}

fn default_ssh_port() -> u16 {
    22
}

/// Read the switch inventory, keyed by device name
pub fn read_switch_connect_options(path: &Path) -> Result<BTreeMap<String, SwitchConnectOptions>> {
    let mut devices: BTreeMap<String, SwitchConnectOptions> = read_toml(path)?;
    for (device_name, options) in devices.iter_mut() {
        options.device_name = device_name.clone();
    }
    Ok(devices)
}

/// Read the fact-store inventory
pub fn read_puppetdb_hosts(path: &Path) -> Result<Vec<PuppetDbHost>> {
    let hosts: BTreeMap<String, PuppetDbHost> = read_toml(path)?;
    Ok(hosts
        .into_iter()
        .map(|(host, mut options)| {
            options.host = host;
            options
        })
        .collect())
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    toml::from_str(&content).map_err(|source| Error::Inventory {
        path: path.to_path_buf(),
        source,
    })
}
