use crate::error::{Error, Result};
use crate::models::{DeviceFamily, FlogiEntry, Interface, InterfaceTable, LldpNeighbor, MacEntry};
use crate::parsers::{comware, nxos};
use crate::render::{self, Stanza};

/// The raw outputs captured from a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Interfaces,
    Flogi,
    Lldp,
    Mactable,
}

impl RawKind {
    pub const ALL: [RawKind; 4] = [
        RawKind::Interfaces,
        RawKind::Flogi,
        RawKind::Lldp,
        RawKind::Mactable,
    ];
}

/// CLI commands wrapped around a configuration push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSession {
    pub enter: &'static str,
    pub exit: &'static str,
    pub save: &'static str,
    pub logout: &'static str,
}

/// What a device family can do
pub trait DeviceDriver: Send + Sync {
    /// Command producing `kind`, possibly depending on the firmware flavor.
    /// `None` when the family has no such output.
    fn acquire_command(&self, kind: RawKind, flavor: &str) -> Option<&'static str>;

    fn parse_interfaces(&self, device_name: &str, text: &str) -> Vec<Interface>;

    fn parse_logins(&self, _device_name: &str, _text: &str) -> Vec<FlogiEntry> {
        Vec::new()
    }

    fn parse_neighbors(&self, device_name: &str, text: &str) -> Vec<LldpNeighbor>;

    fn parse_mactable(&self, device_name: &str, text: &str) -> Vec<MacEntry>;

    fn render(&self, interfaces: &InterfaceTable) -> Vec<Stanza>;

    /// Commands to enter/leave configuration mode and persist the result.
    /// `None` means changes can be sent but not saved.
    fn config_session(&self) -> Option<ConfigSession>;
}

impl DeviceFamily {
    /// The driver for this family, or an error naming the switch when the
    /// family has none
    pub fn driver(&self, device_name: &str) -> Result<&'static dyn DeviceDriver> {
        match self {
            DeviceFamily::CiscoNxos => Ok(&NxosDriver),
            DeviceFamily::HpComware => Ok(&ComwareDriver),
            DeviceFamily::Unmanaged => Ok(&UnmanagedDriver),
            DeviceFamily::Unsupported(device_type) => Err(Error::UnsupportedDeviceFamily {
                device_name: device_name.to_string(),
                device_type: device_type.clone(),
            }),
        }
    }
}

pub struct NxosDriver;

impl DeviceDriver for NxosDriver {
    fn acquire_command(&self, kind: RawKind, _flavor: &str) -> Option<&'static str> {
        Some(match kind {
            RawKind::Interfaces => "show int",
            RawKind::Flogi => "show flogi database",
            RawKind::Lldp => "show lldp neighbors detail | json",
            RawKind::Mactable => "show mac address-table",
        })
    }

    fn parse_interfaces(&self, device_name: &str, text: &str) -> Vec<Interface> {
        nxos::parse_interfaces(device_name, text)
    }

    fn parse_logins(&self, device_name: &str, text: &str) -> Vec<FlogiEntry> {
        nxos::parse_flogi(device_name, text)
    }

    fn parse_neighbors(&self, device_name: &str, text: &str) -> Vec<LldpNeighbor> {
        nxos::parse_lldp(device_name, text)
    }

    fn parse_mactable(&self, device_name: &str, text: &str) -> Vec<MacEntry> {
        nxos::parse_mactable(device_name, text)
    }

    fn render(&self, interfaces: &InterfaceTable) -> Vec<Stanza> {
        render::render_nxos(interfaces)
    }

    fn config_session(&self) -> Option<ConfigSession> {
        Some(ConfigSession {
            enter: "configure terminal",
            exit: "end",
            save: "copy running-config startup-config",
            logout: "exit",
        })
    }
}

pub struct ComwareDriver;

impl DeviceDriver for ComwareDriver {
    fn acquire_command(&self, kind: RawKind, flavor: &str) -> Option<&'static str> {
        match (kind, flavor) {
            (RawKind::Interfaces, _) => Some("display interface"),
            (RawKind::Flogi, _) => None,
            (RawKind::Lldp, "5") => Some("display lldp neighbor-information"),
            (RawKind::Lldp, _) => Some("display lldp neighbor-information agent nearest-bridge verbose"),
            (RawKind::Mactable, _) => Some("display mac-address"),
        }
    }

    fn parse_interfaces(&self, device_name: &str, text: &str) -> Vec<Interface> {
        comware::parse_interfaces(device_name, text)
    }

    fn parse_neighbors(&self, device_name: &str, text: &str) -> Vec<LldpNeighbor> {
        comware::parse_lldp(device_name, text)
    }

    fn parse_mactable(&self, device_name: &str, text: &str) -> Vec<MacEntry> {
        comware::parse_mactable(device_name, text)
    }

    fn render(&self, interfaces: &InterfaceTable) -> Vec<Stanza> {
        render::render_comware(interfaces)
    }

    fn config_session(&self) -> Option<ConfigSession> {
        Some(ConfigSession {
            enter: "system-view",
            exit: "return",
            save: "save main force",
            logout: "quit",
        })
    }
}

/// Switches listed with device_type "none": known to the registry, never
/// queried, never labeled
pub struct UnmanagedDriver;

impl DeviceDriver for UnmanagedDriver {
    fn acquire_command(&self, _kind: RawKind, _flavor: &str) -> Option<&'static str> {
        None
    }

    fn parse_interfaces(&self, _device_name: &str, _text: &str) -> Vec<Interface> {
        Vec::new()
    }

    fn parse_neighbors(&self, _device_name: &str, _text: &str) -> Vec<LldpNeighbor> {
        Vec::new()
    }

    fn parse_mactable(&self, _device_name: &str, _text: &str) -> Vec<MacEntry> {
        Vec::new()
    }

    fn render(&self, _interfaces: &InterfaceTable) -> Vec<Stanza> {
        Vec::new()
    }

    fn config_session(&self) -> Option<ConfigSession> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_family_is_rejected() {
        let family = DeviceFamily::from("juniper_junos");
        match family.driver("edge1") {
            Err(Error::UnsupportedDeviceFamily {
                device_name,
                device_type,
            }) => {
                assert_eq!(device_name, "edge1");
                assert_eq!(device_type, "juniper_junos");
            }
            _ => panic!("expected UnsupportedDeviceFamily"),
        }
    }

    #[test]
    fn test_lldp_command_depends_on_comware_flavor() {
        let driver = DeviceFamily::HpComware.driver("sw").unwrap();
        assert_eq!(
            driver.acquire_command(RawKind::Lldp, "5"),
            Some("display lldp neighbor-information")
        );
        assert_eq!(
            driver.acquire_command(RawKind::Lldp, "7"),
            Some("display lldp neighbor-information agent nearest-bridge verbose")
        );
        assert_eq!(driver.acquire_command(RawKind::Flogi, "7"), None);
    }

    #[test]
    fn test_persistence_commands() {
        let nxos = DeviceFamily::CiscoNxos.driver("sw").unwrap();
        assert_eq!(
            nxos.config_session().map(|s| s.save),
            Some("copy running-config startup-config")
        );
        let comware = DeviceFamily::HpComware.driver("sw").unwrap();
        assert_eq!(comware.config_session().map(|s| s.save), Some("save main force"));
        let unmanaged = DeviceFamily::Unmanaged.driver("sw").unwrap();
        assert!(unmanaged.config_session().is_none());
    }

    #[test]
    fn test_nxos_driver_parses_flogi() {
        let driver = DeviceFamily::CiscoNxos.driver("sw").unwrap();
        let rows = driver.parse_logins(
            "sw",
            "fc2/9  1  0x0b0200  10:00:98:f2:b3:a2:5a:d6 20:00:98:f2:b3:a2:5a:d6\n",
        );
        assert_eq!(rows.len(), 1);
        let comware = DeviceFamily::HpComware.driver("sw").unwrap();
        assert!(comware.parse_logins("sw", "fc2/9 1 x y z").is_empty());
    }
}
