use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{Registry, Switch, SwitchSnapshot};
use crate::utils::list_files;

/// Build the normalized switch from one raw snapshot.
///
/// A family with no driver yields a switch with empty tables; it stays in
/// the registry so that rendering can reject it explicitly.
pub fn build_switch(snapshot: SwitchSnapshot) -> Switch {
    let name = snapshot.device_name.as_str();
    let mut switch = Switch::new(name, snapshot.device_type.clone());
    switch.device_type_flavor = snapshot.device_type_flavor.clone();

    let driver = match snapshot.device_type.driver(name) {
        Ok(driver) => driver,
        Err(e) => {
            tracing::warn!("{}, leaving its tables empty", e);
            return switch;
        }
    };

    switch.interfaces = driver
        .parse_interfaces(name, &snapshot.raw_interfaces)
        .into_iter()
        .collect();
    switch.flogi = driver.parse_logins(name, &snapshot.raw_flogi);
    switch.lldp = driver.parse_neighbors(name, &snapshot.raw_lldp);
    switch.mactable = driver.parse_mactable(name, &snapshot.raw_mactable);

    tracing::debug!(
        "{}: {} interfaces, {} flogi, {} lldp, {} mac entries",
        name,
        switch.interfaces.len(),
        switch.flogi.len(),
        switch.lldp.len(),
        switch.mactable.len()
    );
    switch
}

/// Read and parse one snapshot document
pub fn read_snapshot(path: &Path) -> Result<SwitchSnapshot> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| Error::json(path, e))
}

/// Load every `*.json` snapshot under `dir` into a fresh registry.
/// Any unreadable or malformed snapshot aborts the load.
pub fn read_switches(dir: &Path) -> Result<Registry> {
    let mut registry = Registry::new();
    for path in list_files(dir, ".json")? {
        let snapshot = read_snapshot(&path)?;
        registry.insert(build_switch(snapshot));
    }
    tracing::info!("Loaded {} switches from {}", registry.len(), dir.display());
    Ok(registry)
}
