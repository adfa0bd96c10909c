use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{
    FcHosts, FcPort, HostFacts, HostLldpObservation, IpmiHosts, IpmiInterface,
    NetworkingHosts, NetworkingInterface,
};
use crate::parsers::lldpcli::parse_lldpcli;
use crate::utils::{list_files, normalize_hex};

/// Fact kinds fetched from the fact store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    FibreChannel,
    Ipmi,
    Lldp,
    Networking,
}

impl FactKind {
    pub const ALL: [FactKind; 4] = [
        FactKind::FibreChannel,
        FactKind::Ipmi,
        FactKind::Lldp,
        FactKind::Networking,
    ];

    /// Fact name as known to the fact store
    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::FibreChannel => "fibrechannel",
            FactKind::Ipmi => "ipmi",
            FactKind::Lldp => "lldp",
            FactKind::Networking => "networking",
        }
    }

    /// File-name suffix of documents holding this fact
    pub fn file_suffix(&self) -> String {
        format!(".{}.json", self.as_str())
    }
}

/// Interface name prefixes of physical host NICs ("eth0", "eno1", "enp3s0f0")
const PHYSICAL_NIC_PREFIXES: &[&str] = &["eth", "en"];

#[derive(Debug, Deserialize)]
struct FactEntry<T> {
    certname: String,
    value: T,
}

#[derive(Debug, Default, Deserialize)]
struct FibreChannelValue {
    #[serde(default)]
    hosts: Option<BTreeMap<String, FcHostDetail>>,
}

#[derive(Debug, Default, Deserialize)]
struct FcHostDetail {
    #[serde(default)]
    port_name: Option<String>,
    #[serde(default)]
    node_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IpmiDetail {
    #[serde(default)]
    mac: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LldpValue {
    #[serde(default)]
    neighbors: Option<BTreeMap<String, LldpNeighborDetail>>,
}

#[derive(Debug, Default, Deserialize)]
struct LldpNeighborDetail {
    #[serde(default)]
    sysname: Option<String>,
    #[serde(default)]
    portid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkingValue {
    #[serde(default)]
    interfaces: Option<BTreeMap<String, NetworkingDetail>>,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkingDetail {
    #[serde(default)]
    mac: Option<String>,
}

/// Every entry of every document of `kind` under `dir`, in file-name order.
/// A missing directory holds no documents.
fn read_entries<T: DeserializeOwned>(dir: &Path, kind: FactKind) -> Result<Vec<FactEntry<T>>> {
    if !dir.exists() {
        tracing::info!("No fact directory {}, no {} facts", dir.display(), kind.as_str());
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for path in list_files(dir, &kind.file_suffix())? {
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let doc: Vec<FactEntry<T>> =
            serde_json::from_str(&content).map_err(|e| Error::json(&path, e))?;
        tracing::debug!("{}: {} {} entries", path.display(), doc.len(), kind.as_str());
        entries.extend(doc);
    }
    Ok(entries)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// host -> FC ports, skipping hosts without HBAs and ports without a WWPN
pub fn read_fibrechannel(dir: &Path) -> Result<FcHosts> {
    let mut hosts = FcHosts::new();
    for entry in read_entries::<FibreChannelValue>(dir, FactKind::FibreChannel)? {
        let ports: BTreeMap<String, FcPort> = entry
            .value
            .hosts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(host_id, detail)| {
                let port_name = non_empty(detail.port_name)?;
                Some((
                    host_id,
                    FcPort {
                        port_name: normalize_hex(&port_name),
                        node_name: non_empty(detail.node_name).map(|n| normalize_hex(&n)),
                    },
                ))
            })
            .collect();
        if !ports.is_empty() {
            hosts.insert(entry.certname, ports);
        }
    }
    Ok(hosts)
}

/// host -> BMC MAC addresses
pub fn read_ipmi(dir: &Path) -> Result<IpmiHosts> {
    let mut hosts = IpmiHosts::new();
    for entry in read_entries::<Vec<IpmiDetail>>(dir, FactKind::Ipmi)? {
        let ifaces: Vec<IpmiInterface> = entry
            .value
            .into_iter()
            .filter_map(|detail| non_empty(detail.mac))
            .map(|mac| IpmiInterface {
                mac: normalize_hex(&mac),
            })
            .collect();
        if !ifaces.is_empty() {
            hosts.insert(entry.certname, ifaces);
        }
    }
    Ok(hosts)
}

/// Switch ports as reported by each host's LLDP daemon.
///
/// `sysname` is "<switch> [...]", `portid` is "<subtype> <port>" (e.g.
/// "ifname Ethernet1/4").
pub fn read_lldp(dir: &Path) -> Result<Vec<HostLldpObservation>> {
    let mut observations = Vec::new();
    for entry in read_entries::<LldpValue>(dir, FactKind::Lldp)? {
        for (hostport, detail) in entry.value.neighbors.unwrap_or_default() {
            let switchname = detail
                .sysname
                .as_deref()
                .and_then(|s| s.split_whitespace().next());
            let switchport = detail
                .portid
                .as_deref()
                .and_then(|p| p.split_whitespace().nth(1));
            let (Some(switchname), Some(switchport)) = (switchname, switchport) else {
                tracing::info!(
                    "{} {}: LLDP neighbor without system name or port, ignoring",
                    entry.certname,
                    hostport
                );
                continue;
            };
            observations.push(HostLldpObservation {
                switchname: switchname.to_string(),
                switchport: switchport.to_string(),
                hostname: entry.certname.clone(),
                hostport,
            });
        }
    }
    Ok(observations)
}

/// host -> physical NIC name -> MAC
pub fn read_networking(dir: &Path) -> Result<NetworkingHosts> {
    let mut hosts = NetworkingHosts::new();
    for entry in read_entries::<NetworkingValue>(dir, FactKind::Networking)? {
        let ifaces: BTreeMap<String, NetworkingInterface> = entry
            .value
            .interfaces
            .unwrap_or_default()
            .into_iter()
            .filter(|(name, _)| PHYSICAL_NIC_PREFIXES.iter().any(|p| name.starts_with(p)))
            .filter_map(|(name, detail)| {
                let mac = non_empty(detail.mac)?;
                Some((
                    name,
                    NetworkingInterface {
                        mac: normalize_hex(&mac),
                    },
                ))
            })
            .collect();
        if !ifaces.is_empty() {
            hosts.insert(entry.certname, ifaces);
        }
    }
    Ok(hosts)
}

/// LLDP observations from `<host>.txt` lldpcli captures
pub fn read_lldpcli(dir: &Path) -> Result<Vec<HostLldpObservation>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut observations = Vec::new();
    for path in list_files(dir, ".txt")? {
        let hostname = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".txt"))
            .unwrap_or_default()
            .to_string();
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        observations.extend(parse_lldpcli(&hostname, &content));
    }
    Ok(observations)
}

/// Read and merge every fact kind. Each fact-store host contributes one
/// `<host>.<fact>.json` document per kind; documents merge in file-name order.
pub fn read_host_facts(facts_dir: &Path, lldpcli_dir: &Path) -> Result<HostFacts> {
    let mut lldp = read_lldpcli(lldpcli_dir)?;
    lldp.extend(read_lldp(facts_dir)?);

    let facts = HostFacts {
        fc: read_fibrechannel(facts_dir)?,
        ipmi: read_ipmi(facts_dir)?,
        lldp,
        networking: read_networking(facts_dir)?,
    };

    tracing::info!(
        "Loaded facts: {} FC hosts, {} IPMI hosts, {} LLDP observations, {} networking hosts",
        facts.fc.len(),
        facts.ipmi.len(),
        facts.lldp.len(),
        facts.networking.len()
    );
    Ok(facts)
}
