use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap};

use super::DeviceFamily;

/// Interface is one switch port as parsed from vendor output, plus the
/// attributes derived by reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    /// Vendor-native name, normalized ("Eth1/4", "Po4", "fc2/9")
    pub name: String,
    pub state: Option<String>,
    /// Free-text media/hardware description ("Fibre Channel", "Ethernet")
    pub media_type: Option<String>,
    /// Hardware address or WWN as contiguous lower-case hex
    pub address: Option<String>,
    /// Currently configured label
    pub description: Option<String>,
    /// Member ports of an aggregate
    pub members: Option<Vec<String>>,
    /// Other names this port is known by (long or abbreviated vendor forms)
    pub switchport_aliases: BTreeSet<String>,
    /// Stack-member port (IRF/stacking link)
    pub stack: bool,

    // Derived by reconciliation
    pub hostname: Option<String>,
    pub hostport: Option<String>,
    pub remote_switchname: Option<String>,
    pub remote_switchport: Option<String>,
    /// Label to configure; `None` means "no label", distinct from `Some("")`
    pub new_description: Option<String>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn answers_to(&self, port: &str) -> bool {
        self.name == port || self.switchport_aliases.contains(port)
    }
}

/// Insertion-ordered interface map keyed by name, with alias lookup.
///
/// Names are unique: inserting an interface whose name already exists
/// replaces the earlier record in place.
#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    entries: Vec<Interface>,
    index: HashMap<String, usize>,
}

impl InterfaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, iface: Interface) {
        match self.index.get(&iface.name) {
            Some(&pos) => self.entries[pos] = iface,
            None => {
                self.index.insert(iface.name.clone(), self.entries.len());
                self.entries.push(iface);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Interface> {
        self.index.get(name).map(|&pos| &self.entries[pos])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Interface> {
        self.index.get(name).map(|&pos| &mut self.entries[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Find a port by exact name, then by alias
    pub fn resolve_mut(&mut self, port: &str) -> Option<&mut Interface> {
        let pos = match self.index.get(port) {
            Some(&pos) => pos,
            None => self.entries.iter().position(|iface| iface.answers_to(port))?,
        };
        Some(&mut self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Interface> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Interface> for InterfaceTable {
    fn from_iter<I: IntoIterator<Item = Interface>>(iter: I) -> Self {
        let mut table = InterfaceTable::new();
        for iface in iter {
            table.insert(iface);
        }
        table
    }
}

/// One row of the Fibre Channel fabric login table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlogiEntry {
    pub switchport: String,
    pub vsan: String,
    pub fcid: String,
    pub port_name: String,
    pub node_name: String,
}

/// A neighbor seen by the switch itself on one of its ports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LldpNeighbor {
    pub switchport: String,
    pub hostname: Option<String>,
    pub hostport: Option<String>,
}

/// A learned MAC address table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacEntry {
    pub address: String,
    pub switchport: String,
}

/// Switch is the normalized model of one device
#[derive(Debug, Clone)]
pub struct Switch {
    pub device_name: String,
    pub device_type: DeviceFamily,
    pub device_type_flavor: String,
    pub interfaces: InterfaceTable,
    pub flogi: Vec<FlogiEntry>,
    pub lldp: Vec<LldpNeighbor>,
    pub mactable: Vec<MacEntry>,
}

impl Switch {
    pub fn new(device_name: impl Into<String>, device_type: DeviceFamily) -> Self {
        Self {
            device_name: device_name.into(),
            device_type,
            device_type_flavor: String::new(),
            interfaces: InterfaceTable::new(),
            flogi: Vec::new(),
            lldp: Vec::new(),
            mactable: Vec::new(),
        }
    }
}

/// Registry holds every switch of one run, keyed by device name
#[derive(Debug, Clone, Default)]
pub struct Registry {
    switches: BTreeMap<String, Switch>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, switch: Switch) {
        self.switches.insert(switch.device_name.clone(), switch);
    }

    pub fn get(&self, device_name: &str) -> Option<&Switch> {
        self.switches.get(device_name)
    }

    pub fn get_mut(&mut self, device_name: &str) -> Option<&mut Switch> {
        self.switches.get_mut(device_name)
    }

    pub fn contains(&self, device_name: &str) -> bool {
        self.switches.contains_key(device_name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Switch> {
        self.switches.iter()
    }

    pub fn switches_mut(&mut self) -> btree_map::ValuesMut<'_, String, Switch> {
        self.switches.values_mut()
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }
}

impl FromIterator<Switch> for Registry {
    fn from_iter<I: IntoIterator<Item = Switch>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for switch in iter {
            registry.insert(switch);
        }
        registry
    }
}

/// SwitchSnapshot is the on-disk raw acquisition result for one switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchSnapshot {
    pub device_name: String,
    pub device_type: DeviceFamily,
    #[serde(default)]
    pub device_type_flavor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquired_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub raw_interfaces: String,
    #[serde(default)]
    pub raw_flogi: String,
    #[serde(default)]
    pub raw_lldp: String,
    #[serde(default)]
    pub raw_mactable: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface_with_alias(name: &str, alias: &str) -> Interface {
        let mut iface = Interface::new(name);
        iface.switchport_aliases.insert(alias.to_string());
        iface
    }

    #[test]
    fn test_interface_table_keeps_insertion_order() {
        let table: InterfaceTable = ["Eth1/10", "Eth1/2", "fc2/9"]
            .into_iter()
            .map(Interface::new)
            .collect();
        let names: Vec<&str> = table.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Eth1/10", "Eth1/2", "fc2/9"]);
    }

    #[test]
    fn test_interface_table_duplicate_name_replaces() {
        let mut table = InterfaceTable::new();
        table.insert(Interface::new("Eth1/1"));
        let mut again = Interface::new("Eth1/1");
        again.description = Some("second".to_string());
        table.insert(again);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Eth1/1").unwrap().description.as_deref(), Some("second"));
    }

    #[test]
    fn test_resolve_by_alias() {
        let mut table = InterfaceTable::new();
        table.insert(iface_with_alias("Eth1/4", "Ethernet1/4"));

        assert_eq!(table.resolve_mut("Eth1/4").unwrap().name, "Eth1/4");
        assert_eq!(table.resolve_mut("Ethernet1/4").unwrap().name, "Eth1/4");
        assert!(table.resolve_mut("Ethernet1/5").is_none());
        assert!(!table.contains("Ethernet1/4"));
    }

    #[test]
    fn test_snapshot_defaults_missing_raw_fields() {
        let snapshot: SwitchSnapshot = serde_json::from_str(
            r#"{"device_name": "sw1", "device_type": "hp_comware", "raw_interfaces": "x"}"#,
        )
        .unwrap();
        assert_eq!(snapshot.device_type, DeviceFamily::HpComware);
        assert_eq!(snapshot.device_type_flavor, "");
        assert_eq!(snapshot.raw_interfaces, "x");
        assert_eq!(snapshot.raw_flogi, "");
        assert!(snapshot.acquired_at.is_none());
    }
}
