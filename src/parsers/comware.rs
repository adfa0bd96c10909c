use regex_lite::Regex;

use crate::models::{Interface, LldpNeighbor, MacEntry};
use crate::utils::{indent_of, normalize_hex};

/// Long interface type names and the abbreviations Comware uses for them in
/// MAC tables, LLDP and brief listings
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("Ten-GigabitEthernet", "XGE"),
    ("GigabitEthernet", "GE"),
    ("M-GigabitEthernet", "MGE"),
    ("FortyGigE", "FGE"),
    ("HundredGigE", "HGE"),
    ("Twenty-FiveGigE", "WGE"),
    ("Bridge-Aggregation", "BAGG"),
];

/// Abbreviated form of a full interface name, if the type has one
fn abbreviate(name: &str) -> Option<String> {
    ABBREVIATIONS.iter().find_map(|(long, short)| {
        name.strip_prefix(long)
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .map(|rest| format!("{}{}", short, rest))
    })
}

fn start_interface(name: &str) -> Interface {
    let mut iface = Interface::new(name);
    if let Some(short) = abbreviate(name) {
        iface.switchport_aliases.insert(short);
    }
    iface
}

/// Parse "display interface".
///
/// Blocks are separated by blank lines. Comware 5 puts the state on the
/// name line (" GigabitEthernet1/0/1 current state: UP"), Comware 7 has a
/// bare name line followed by "Current state: UP".
///
/// ```text
/// Ten-GigabitEthernet2/0/34
/// Current state: UP
/// IP packet frame type: Ethernet II, hardware address: 5c8a-3828-71a8
/// Description: zomg
/// Media type is twisted pair, port hardware type is 1000_BASE_T_AN_SFP
/// ```
pub fn parse_interfaces(device_name: &str, text: &str) -> Vec<Interface> {
    let mut ifaces = Vec::new();
    let mut current: Option<Interface> = None;

    for raw in text.lines() {
        if raw.trim().is_empty() {
            if let Some(done) = current.take() {
                ifaces.push(done);
            }
            continue;
        }

        let indent = indent_of(raw);
        let line = raw.trim();

        let Some(iface) = current.as_mut() else {
            if indent <= 1 && line.contains("current state:") {
                let name = line.split_whitespace().next().unwrap_or(line);
                let mut iface = start_interface(name);
                iface.state = line
                    .split_once("current state:")
                    .map(|(_, state)| state.trim().to_lowercase());
                current = Some(iface);
            } else if indent == 0 {
                current = Some(start_interface(line));
            }
            continue;
        };

        // Counter breakdowns and other continuation lines are indented deeper
        if indent > 1 {
            continue;
        }

        if line.starts_with("Media type is") {
            let hardware_type = line
                .split(", ")
                .nth(1)
                .and_then(|part| part.split_whitespace().last());
            if hardware_type.is_some_and(|t| t.starts_with("STACK_")) {
                iface.stack = true;
            }
            continue;
        }

        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        let value = value.trim();
        if key == "Current state" {
            iface.state = Some(value.to_lowercase());
        } else if key == "Description" {
            iface.description = Some(value.to_string());
        } else if key.eq_ignore_ascii_case("IP packet frame type") {
            if let Some(address) = hardware_address(value) {
                iface.media_type = Some("Ethernet".to_string());
                iface.address = Some(normalize_hex(address));
            }
        }
    }

    if let Some(done) = current {
        ifaces.push(done);
    }

    tracing::debug!("{}: parsed {} interfaces", device_name, ifaces.len());
    ifaces
}

/// "Ethernet II, hardware address: 5c8a-3828-71a8" -> "5c8a-3828-71a8"
fn hardware_address(value: &str) -> Option<&str> {
    let lower = value.to_ascii_lowercase();
    let start = lower.find("hardware address:")? + "hardware address:".len();
    value[start..].split_whitespace().next()
}

/// Parse "display lldp neighbor-information [verbose]".
///
/// ```text
/// LLDP neighbor-information of port 33[Ten-GigabitEthernet1/0/33]:
/// LLDP agent nearest-bridge:
/// Port ID type        : MAC address
/// Port ID             : acxx-xxxx-xxxx
/// Port description    : eth5
/// System name         : something
/// ```
///
/// "Port ID description" replaces the port ID only when the port ID is a MAC
/// address; otherwise the port ID type pairing is dropped.
pub fn parse_lldp(device_name: &str, text: &str) -> Vec<LldpNeighbor> {
    let mut neighbors = Vec::new();
    let mut current: Option<LldpNeighbor> = None;
    let mut port_id_type: Option<String> = None;

    for raw in text.lines() {
        if raw.trim().is_empty() {
            if let Some(done) = current.take() {
                neighbors.push(done);
            }
            port_id_type = None;
            continue;
        }

        let indent = indent_of(raw);
        let line = raw.trim();

        let Some(neighbor) = current.as_mut() else {
            if indent == 0 && line.starts_with("LLDP neighbor-information of port") {
                let switchport = line
                    .split_once('[')
                    .and_then(|(_, rest)| rest.split_once(']'))
                    .map(|(port, _)| port.trim())
                    .filter(|port| !port.is_empty());
                if let Some(switchport) = switchport {
                    current = Some(LldpNeighbor {
                        switchport: switchport.to_string(),
                        hostname: None,
                        hostport: None,
                    });
                }
            }
            continue;
        };

        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "Port ID" => neighbor.hostport = Some(value.to_string()),
            "Port ID type" => port_id_type = Some(value.to_string()),
            "Port ID description" => {
                if port_id_type.as_deref() == Some("MAC address") {
                    neighbor.hostport = Some(value.to_string());
                } else {
                    port_id_type = None;
                }
            }
            "System name" => neighbor.hostname = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(done) = current {
        neighbors.push(done);
    }

    tracing::debug!("{}: parsed {} lldp neighbors", device_name, neighbors.len());
    neighbors
}

/// Parse "display mac-address". Only learned rows are kept.
///
/// ```text
/// MAC Address      VLAN ID    State            Port/Nickname            Aging
/// 0025-90ab-cdef   191        Learned          XGE1/0/33                Y
/// ```
pub fn parse_mactable(device_name: &str, text: &str) -> Vec<MacEntry> {
    let Ok(mac_re) = Regex::new(r"^[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}$") else {
        return Vec::new();
    };

    let entries: Vec<MacEntry> = text
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 || !mac_re.is_match(cols[0]) {
                return None;
            }
            if !cols[2].eq_ignore_ascii_case("learned") {
                return None;
            }
            Some(MacEntry {
                address: normalize_hex(cols[0]),
                switchport: cols[3].to_string(),
            })
        })
        .collect();

    tracing::debug!("{}: parsed {} mac table entries", device_name, entries.len());
    entries
}
