use regex_lite::Regex;
use serde_json::Value;

use crate::models::{well_known_port, FlogiEntry, Interface, LldpNeighbor, MacEntry};
use crate::utils::{indent_of, normalize_hex};

/// Collapse long NX-OS interface names to the short form used everywhere else
fn normalize_name(name: &str) -> String {
    name.replace("Ethernet", "Eth").replace("port-channel", "Po")
}

fn start_interface(raw_name: &str, state: Option<&str>) -> Interface {
    let mut iface = Interface::new(normalize_name(raw_name));
    if iface.name != raw_name {
        iface.switchport_aliases.insert(raw_name.to_string());
    }
    iface.state = state.map(|s| s.trim_end_matches(',').to_string());
    iface
}

/// Parse "show interface".
///
/// ```text
/// fc2/11 is down (Link failure: loss of sync)
///     Port description is foo
///     Hardware is Fibre Channel, SFP is short wave laser w/o OFC (SN)
///     Port WWN is 20:4b:00:de:fb:ee:ab:c0
/// Ethernet1/4 is up
///   Hardware: 1000/10000 Ethernet, address: 00de.fbee.abab (bia 00de.fbee.abab)
///   Description: bar
/// ```
pub fn parse_interfaces(device_name: &str, text: &str) -> Vec<Interface> {
    let mut ifaces = Vec::new();
    let mut current: Option<Interface> = None;

    for raw in text.lines() {
        let indent = indent_of(raw);
        let line = raw.trim();
        let words: Vec<&str> = line.split_whitespace().collect();

        // "<name> is <state> ..." at column zero opens a new interface
        if indent == 0 && words.get(1) == Some(&"is") {
            if let Some(done) = current.take() {
                ifaces.push(done);
            }
            current = Some(start_interface(words[0], words.get(2).copied()));
            continue;
        }

        let Some(iface) = current.as_mut() else {
            continue;
        };
        if indent == 0 {
            continue;
        }

        if let Some(rest) = line.strip_prefix("Port description is ") {
            iface.description = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Description:") {
            iface.description = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Port WWN is ") {
            iface.address = Some(normalize_hex(rest));
        } else if let Some(rest) = line.strip_prefix("Hardware is ") {
            let media = rest.split(',').next().unwrap_or(rest).trim();
            iface.media_type = Some(media.to_string());
        } else if let Some(rest) = line.strip_prefix("Members in this channel:") {
            let members = rest
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            iface.members = Some(members);
        } else if line.starts_with("Hardware:") {
            parse_hardware_line(iface, line);
        }
    }

    if let Some(done) = current {
        ifaces.push(done);
    }

    tracing::debug!("{}: parsed {} interfaces", device_name, ifaces.len());
    ifaces
}

/// "Hardware: 1000/10000 Ethernet, address: 00de.fbee.abab (bia 00de.fbee.abab)"
fn parse_hardware_line(iface: &mut Interface, line: &str) {
    let mut parts = line.split(',');

    if let Some((_, media)) = parts.next().and_then(|p| p.split_once(':')) {
        iface.media_type = Some(media.trim().to_string());
    }

    let address = parts
        .next()
        .and_then(|p| p.split_once(':'))
        .and_then(|(_, value)| value.split_whitespace().next());
    if let Some(address) = address {
        iface.address = Some(normalize_hex(address));
    }
}

/// Parse "show flogi database".
///
/// ```text
/// INTERFACE        VSAN    FCID           PORT NAME               NODE NAME
/// fc2/9            1     0x0b0200  10:00:98:f2:b3:a2:5a:d6 20:00:98:f2:b3:a2:5a:d6
/// ```
pub fn parse_flogi(device_name: &str, text: &str) -> Vec<FlogiEntry> {
    let rows: Vec<FlogiEntry> = text
        .lines()
        .filter(|line| line.starts_with("fc"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 5 {
                return None;
            }
            Some(FlogiEntry {
                switchport: cols[0].to_string(),
                vsan: cols[1].to_string(),
                fcid: cols[2].trim_start_matches("0x").to_string(),
                port_name: normalize_hex(cols[3]),
                node_name: normalize_hex(cols[4]),
            })
        })
        .collect();

    tracing::debug!("{}: parsed {} flogi rows", device_name, rows.len());
    rows
}

/// Parse "show lldp neighbors detail | json", falling back to the plain-text
/// rendering of the same command when the document is not JSON.
pub fn parse_lldp(device_name: &str, text: &str) -> Vec<LldpNeighbor> {
    let neighbors = match serde_json::from_str::<Value>(text) {
        Ok(doc) => parse_lldp_json(&doc),
        Err(_) => parse_lldp_text(text),
    };
    tracing::debug!("{}: parsed {} lldp neighbors", device_name, neighbors.len());
    neighbors
}

fn parse_lldp_json(doc: &Value) -> Vec<LldpNeighbor> {
    // A single neighbor is rendered as an object rather than a one-element list
    let rows: Vec<&Value> = match &doc["TABLE_nbor_detail"]["ROW_nbor_detail"] {
        Value::Array(rows) => rows.iter().collect(),
        row @ Value::Object(_) => vec![row],
        _ => Vec::new(),
    };

    rows.into_iter()
        .filter_map(|row| {
            let switchport = row["l_port_id"].as_str()?;
            if switchport == well_known_port::MGMT {
                return None;
            }
            Some(LldpNeighbor {
                switchport: switchport.to_string(),
                hostname: row["sys_name"].as_str().map(str::to_string),
                hostport: row["port_id"].as_str().map(str::to_string),
            })
        })
        .collect()
}

/// A port id that is a hardware address rather than an interface name
fn is_mac_address(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_hexdigit() || matches!(c, '.' | ':' | '-'))
        && normalize_hex(value).len() == 12
}

/// Plain "show lldp neighbors detail": blank-line separated blocks.
///
/// The neighbor port is "Port id". "Port Description" replaces it only when
/// the port id is a MAC address (hosts without an ifname subtype).
fn parse_lldp_text(text: &str) -> Vec<LldpNeighbor> {
    #[derive(Default)]
    struct Block {
        switchport: Option<String>,
        port_id: Option<String>,
        port_description: Option<String>,
        hostname: Option<String>,
    }

    fn advertised(value: &str) -> Option<String> {
        let value = value.trim();
        (value != "not advertised" && !value.is_empty()).then(|| value.to_string())
    }

    let mut neighbors = Vec::new();
    let mut current = Block::default();

    for line in text.lines().chain(std::iter::once("")) {
        let line = line.trim();
        if line.is_empty() {
            let done = std::mem::take(&mut current);
            let Some(switchport) = done.switchport else {
                continue;
            };
            let hostport = match (done.port_id, done.port_description) {
                (Some(id), Some(descr)) if is_mac_address(&id) => Some(descr),
                (id, _) => id,
            };
            neighbors.push(LldpNeighbor {
                switchport,
                hostname: done.hostname,
                hostport,
            });
        } else if let Some(port) = line.strip_prefix("Local Port id:") {
            let port = port.trim();
            if port != well_known_port::MGMT {
                current.switchport = Some(port.to_string());
            }
        } else if let Some(value) = line.strip_prefix("Port id:") {
            current.port_id = advertised(value);
        } else if let Some(value) = line.strip_prefix("Port Description:") {
            current.port_description = advertised(value);
        } else if let Some(value) = line.strip_prefix("System Name:") {
            current.hostname = advertised(value);
        }
    }

    neighbors
}

/// Parse "show mac address-table". Only dynamically learned rows are kept.
///
/// ```text
///    VLAN     MAC Address      Type      age     Secure NTFY Ports
/// ---------+-----------------+--------+---------+------+----+------------------
/// *  191     0025.90ab.cdef   dynamic  0         F      F    Eth1/4
/// G    -     00de.fbee.abab   static   -         F      F    sup-eth1(R)
/// ```
pub fn parse_mactable(device_name: &str, text: &str) -> Vec<MacEntry> {
    let Ok(mac_re) = Regex::new(r"^[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}$") else {
        return Vec::new();
    };

    let entries: Vec<MacEntry> = text
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            let mac = cols.iter().find(|c| mac_re.is_match(c))?;
            if !cols.iter().any(|c| c.eq_ignore_ascii_case("dynamic")) {
                return None;
            }
            let port = cols.last()?;
            Some(MacEntry {
                address: normalize_hex(mac),
                switchport: port.to_string(),
            })
        })
        .collect();

    tracing::debug!("{}: parsed {} mac table entries", device_name, entries.len());
    entries
}
