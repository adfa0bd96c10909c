use crate::models::{label_kind, well_known_port, HostFacts, Interface, Registry};
use crate::utils::strip_domain;

/// Derived port attributes written by the linking passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAttr {
    Hostname,
    Hostport,
    RemoteSwitchname,
    RemoteSwitchport,
}

impl PortAttr {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortAttr::Hostname => "hostname",
            PortAttr::Hostport => "hostport",
            PortAttr::RemoteSwitchname => "remote_switchname",
            PortAttr::RemoteSwitchport => "remote_switchport",
        }
    }

    fn slot<'a>(&self, iface: &'a mut Interface) -> &'a mut Option<String> {
        match self {
            PortAttr::Hostname => &mut iface.hostname,
            PortAttr::Hostport => &mut iface.hostport,
            PortAttr::RemoteSwitchname => &mut iface.remote_switchname,
            PortAttr::RemoteSwitchport => &mut iface.remote_switchport,
        }
    }
}

/// Write one attribute on a switch port.
///
/// The port is found by name, then by alias. An unknown switch or port is
/// logged and ignored. Without `overwrite` an attribute that is already set
/// is left alone. Returns whether the attribute was written.
pub fn set_port_attr(
    registry: &mut Registry,
    switchname: &str,
    switchport: &str,
    attr: PortAttr,
    value: &str,
    overwrite: bool,
) -> bool {
    let Some(switch) = registry.get_mut(switchname) else {
        tracing::info!("switch {} not configured, ignoring", switchname);
        return false;
    };
    let Some(iface) = switch.interfaces.resolve_mut(switchport) else {
        tracing::info!("switch {} port {} not found, ignoring", switchname, switchport);
        return false;
    };

    let slot = attr.slot(iface);
    if !overwrite && slot.is_some() {
        return false;
    }
    *slot = Some(value.to_string());
    tracing::debug!("{} {}: {} = {}", switchname, switchport, attr.as_str(), value);
    true
}

/// Locate the switch port a MAC address was learned on.
///
/// A MAC may be seen on several ports (uplinks, intermediate bridges). The
/// first candidate whose port has exactly one learned entry wins; if no such
/// port exists the MAC is unresolved.
pub fn find_unique_mac(registry: &Registry, mac: &str) -> Option<(String, String)> {
    for (switchname, switch) in registry.iter() {
        for entry in switch.mactable.iter().filter(|e| e.address == mac) {
            let learned_on_port = switch
                .mactable
                .iter()
                .filter(|e| e.switchport == entry.switchport)
                .count();
            if learned_on_port == 1 {
                return Some((switchname.clone(), entry.switchport.clone()));
            }
        }
    }
    None
}

/// Attribute switch ports to hosts from the hosts' own LLDP observations
pub fn link_hosts_lldp(registry: &mut Registry, facts: &HostFacts) {
    for obs in &facts.lldp {
        set_port_attr(registry, &obs.switchname, &obs.switchport, PortAttr::Hostname, &obs.hostname, true);
        set_port_attr(registry, &obs.switchname, &obs.switchport, PortAttr::Hostport, &obs.hostport, true);
    }
}

/// Attribute Fibre Channel ports to hosts by matching HBA port names against
/// the fabric login tables
pub fn link_hosts_fc(registry: &mut Registry, facts: &HostFacts) {
    for (host, ports) in &facts.fc {
        for (host_id, port) in ports {
            let logins: Vec<(String, String)> = registry
                .iter()
                .flat_map(move |(switchname, switch)| {
                    switch
                        .flogi
                        .iter()
                        .filter(move |row| row.port_name == port.port_name)
                        .map(move |row| (switchname.clone(), row.switchport.clone()))
                })
                .collect();

            for (switchname, switchport) in logins {
                set_port_attr(registry, &switchname, &switchport, PortAttr::Hostname, host, true);
                set_port_attr(registry, &switchname, &switchport, PortAttr::Hostport, host_id, true);
            }
        }
    }
}

/// Attribute ports to host BMCs by unique MAC
pub fn link_hosts_ipmi(registry: &mut Registry, facts: &HostFacts) {
    for (host, ifaces) in &facts.ipmi {
        for iface in ifaces {
            if let Some((switchname, switchport)) = find_unique_mac(registry, &iface.mac) {
                set_port_attr(registry, &switchname, &switchport, PortAttr::Hostname, host, false);
                set_port_attr(
                    registry,
                    &switchname,
                    &switchport,
                    PortAttr::Hostport,
                    well_known_port::LOM,
                    false,
                );
            }
        }
    }
}

/// Attribute ports to host NICs by unique MAC
pub fn link_hosts_networking(registry: &mut Registry, facts: &HostFacts) {
    for (host, ifaces) in &facts.networking {
        for (name, iface) in ifaces {
            if let Some((switchname, switchport)) = find_unique_mac(registry, &iface.mac) {
                set_port_attr(registry, &switchname, &switchport, PortAttr::Hostname, host, false);
                set_port_attr(registry, &switchname, &switchport, PortAttr::Hostport, name, false);
            }
        }
    }
}

/// Cross-reference both ends of every link whose LLDP neighbor is a known
/// switch
pub fn link_switches_lldp(registry: &mut Registry) {
    struct Link {
        switchname: String,
        switchport: String,
        neighbor: String,
        neighbor_port: Option<String>,
    }

    let links: Vec<Link> = registry
        .iter()
        .flat_map(|(switchname, switch)| {
            switch.lldp.iter().filter_map(move |n| {
                let neighbor = n.hostname.as_ref()?;
                Some(Link {
                    switchname: switchname.clone(),
                    switchport: n.switchport.clone(),
                    neighbor: neighbor.clone(),
                    neighbor_port: n.hostport.clone(),
                })
            })
        })
        .filter(|link| registry.contains(&link.neighbor))
        .collect();

    for link in links {
        set_port_attr(
            registry,
            &link.switchname,
            &link.switchport,
            PortAttr::RemoteSwitchname,
            &link.neighbor,
            false,
        );
        let Some(neighbor_port) = link.neighbor_port else {
            tracing::info!(
                "switch {} port {}: neighbor {} sent no port id",
                link.switchname,
                link.switchport,
                link.neighbor
            );
            continue;
        };
        set_port_attr(
            registry,
            &link.switchname,
            &link.switchport,
            PortAttr::RemoteSwitchport,
            &neighbor_port,
            false,
        );
        set_port_attr(
            registry,
            &link.neighbor,
            &neighbor_port,
            PortAttr::RemoteSwitchname,
            &link.switchname,
            false,
        );
        set_port_attr(
            registry,
            &link.neighbor,
            &neighbor_port,
            PortAttr::RemoteSwitchport,
            &link.switchport,
            false,
        );
    }
}

/// An attribute value, with the empty string counting as unset
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Derive the label of one port; `None` means no label
pub fn format_description(iface: &Interface) -> Option<String> {
    let label = if let Some(hostname) = present(&iface.hostname) {
        let host = strip_domain(hostname);
        Some(match present(&iface.hostport) {
            Some(port) => format!("{}: {} {}", label_kind::CUST, host, port),
            None => format!("{}: {}", label_kind::CUST, host),
        })
    } else if let Some(remote) = present(&iface.remote_switchname) {
        let remote = strip_domain(remote);
        let remote_port = present(&iface.remote_switchport);
        let kind = if remote_port == Some(well_known_port::MGMT) {
            label_kind::CUST
        } else {
            label_kind::CORE
        };
        Some(match remote_port {
            Some(port) => format!("{}: {} {}", kind, remote, port),
            None => format!("{}: {}", kind, remote),
        })
    } else {
        None
    };

    match label {
        Some(label) if iface.stack => Some(format!("{}{}", label, label_kind::STACK_SUFFIX)),
        None if iface.stack => {
            tracing::info!("{}: stack port without a label, not setting STACK attribute", iface.name);
            None
        }
        label => label,
    }
}

/// Run every linking pass, then derive `new_description` for every port
/// except the management port.
///
/// Host LLDP and FC linking overwrite, IPMI and networking linking only fill
/// unset attributes. Switch-to-switch linking runs last, after host
/// attribution is settled.
pub fn reconcile(registry: &mut Registry, facts: &HostFacts) {
    link_hosts_lldp(registry, facts);
    link_hosts_fc(registry, facts);
    link_hosts_ipmi(registry, facts);
    link_hosts_networking(registry, facts);
    link_switches_lldp(registry);

    for switch in registry.switches_mut() {
        for iface in switch.interfaces.iter_mut() {
            if iface.name == well_known_port::MGMT {
                continue;
            }
            iface.new_description = format_description(iface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DeviceFamily, FcPort, FlogiEntry, HostLldpObservation, IpmiInterface, LldpNeighbor, MacEntry,
        NetworkingInterface, Switch,
    };
    use std::collections::BTreeMap;

    fn switch(name: &str, ports: &[&str]) -> Switch {
        let mut switch = Switch::new(name, DeviceFamily::CiscoNxos);
        switch.interfaces = ports.iter().map(|p| Interface::new(*p)).collect();
        switch
    }

    fn mac(address: &str, switchport: &str) -> MacEntry {
        MacEntry {
            address: address.to_string(),
            switchport: switchport.to_string(),
        }
    }

    fn label(registry: &Registry, switchname: &str, port: &str) -> Option<String> {
        registry
            .get(switchname)
            .and_then(|s| s.interfaces.get(port))
            .and_then(|i| i.new_description.clone())
    }

    #[test]
    fn test_format_description_host() {
        let mut iface = Interface::new("Eth1/1");
        iface.hostname = Some("web01.example.com".to_string());
        iface.hostport = Some("eth0".to_string());
        assert_eq!(format_description(&iface).as_deref(), Some("Cust: web01 eth0"));

        iface.hostport = None;
        assert_eq!(format_description(&iface).as_deref(), Some("Cust: web01"));
    }

    #[test]
    fn test_format_description_remote_switch() {
        let mut iface = Interface::new("Eth1/2");
        iface.remote_switchname = Some("core-sw2.example.com".to_string());
        iface.remote_switchport = Some("Eth2/1".to_string());
        assert_eq!(format_description(&iface).as_deref(), Some("Core: core-sw2 Eth2/1"));

        iface.remote_switchport = Some("mgmt0".to_string());
        assert_eq!(format_description(&iface).as_deref(), Some("Cust: core-sw2 mgmt0"));

        iface.remote_switchport = None;
        assert_eq!(format_description(&iface).as_deref(), Some("Core: core-sw2"));
    }

    #[test]
    fn test_format_description_host_wins_over_switch() {
        let mut iface = Interface::new("Eth1/3");
        iface.remote_switchname = Some("core-sw2".to_string());
        iface.remote_switchport = Some("Eth2/1".to_string());
        iface.hostname = Some("web02".to_string());
        assert_eq!(format_description(&iface).as_deref(), Some("Cust: web02"));
    }

    #[test]
    fn test_format_description_stack() {
        let mut iface = Interface::new("Ten-GigabitEthernet1/0/49");
        iface.stack = true;
        assert_eq!(format_description(&iface), None);

        iface.remote_switchname = Some("sw2".to_string());
        iface.remote_switchport = Some("XGE2/0/49".to_string());
        assert_eq!(
            format_description(&iface).as_deref(),
            Some("Core: sw2 XGE2/0/49 [STACK]")
        );
    }

    #[test]
    fn test_unlinked_port_has_no_label() {
        assert_eq!(format_description(&Interface::new("Eth1/9")), None);
    }

    #[test]
    fn test_empty_ports_count_as_unset() {
        let mut iface = Interface::new("Eth1/2");
        iface.remote_switchname = Some("sw2".to_string());
        iface.remote_switchport = Some(String::new());
        assert_eq!(format_description(&iface).as_deref(), Some("Core: sw2"));

        iface.hostname = Some("web01".to_string());
        iface.hostport = Some(String::new());
        assert_eq!(format_description(&iface).as_deref(), Some("Cust: web01"));

        iface.hostname = Some(String::new());
        assert_eq!(format_description(&iface).as_deref(), Some("Core: sw2"));
    }

    #[test]
    fn test_set_port_attr_overwrite_rules() {
        let mut registry: Registry = [switch("sw1", &["Eth1/1"])].into_iter().collect();

        assert!(set_port_attr(&mut registry, "sw1", "Eth1/1", PortAttr::Hostname, "a", false));
        assert!(!set_port_attr(&mut registry, "sw1", "Eth1/1", PortAttr::Hostname, "b", false));
        assert_eq!(
            registry.get("sw1").unwrap().interfaces.get("Eth1/1").unwrap().hostname.as_deref(),
            Some("a")
        );
        assert!(set_port_attr(&mut registry, "sw1", "Eth1/1", PortAttr::Hostname, "c", true));
        assert_eq!(
            registry.get("sw1").unwrap().interfaces.get("Eth1/1").unwrap().hostname.as_deref(),
            Some("c")
        );
    }

    #[test]
    fn test_set_port_attr_unknown_references_are_ignored() {
        let mut registry: Registry = [switch("sw1", &["Eth1/1"])].into_iter().collect();
        assert!(!set_port_attr(&mut registry, "sw9", "Eth1/1", PortAttr::Hostname, "a", true));
        assert!(!set_port_attr(&mut registry, "sw1", "Eth1/99", PortAttr::Hostname, "a", true));
    }

    #[test]
    fn test_set_port_attr_resolves_alias() {
        let mut sw = switch("sw1", &[]);
        let mut iface = Interface::new("Eth1/4");
        iface.switchport_aliases.insert("Ethernet1/4".to_string());
        sw.interfaces.insert(iface);
        let mut registry: Registry = [sw].into_iter().collect();

        assert!(set_port_attr(&mut registry, "sw1", "Ethernet1/4", PortAttr::Hostport, "eth0", true));
        assert_eq!(
            registry.get("sw1").unwrap().interfaces.get("Eth1/4").unwrap().hostport.as_deref(),
            Some("eth0")
        );
    }

    #[test]
    fn test_find_unique_mac_prefers_unshared_port() {
        let mut sw1 = switch("sw1", &["Eth1/1", "Eth1/2"]);
        sw1.mactable = vec![
            mac("aabbccddeeff", "Eth1/1"),
            mac("111111111111", "Eth1/1"),
            mac("aabbccddeeff", "Eth1/2"),
            mac("222222222222", "Eth1/2"),
        ];
        let mut sw2 = switch("sw2", &["Eth1/7"]);
        sw2.mactable = vec![mac("aabbccddeeff", "Eth1/7")];
        let registry: Registry = [sw1, sw2].into_iter().collect();

        assert_eq!(
            find_unique_mac(&registry, "aabbccddeeff"),
            Some(("sw2".to_string(), "Eth1/7".to_string()))
        );
        assert_eq!(find_unique_mac(&registry, "111111111111"), None);
        assert_eq!(find_unique_mac(&registry, "999999999999"), None);
    }

    #[test]
    fn test_fc_linking() {
        let mut sw = switch("mds1", &["fc2/9"]);
        sw.flogi = vec![FlogiEntry {
            switchport: "fc2/9".to_string(),
            vsan: "1".to_string(),
            fcid: "0x0b0200".to_string(),
            port_name: "100098f2b3a25ad6".to_string(),
            node_name: "200098f2b3a25ad6".to_string(),
        }];
        let mut registry: Registry = [sw].into_iter().collect();

        let mut facts = HostFacts::default();
        facts.fc.insert(
            "db01".to_string(),
            BTreeMap::from([(
                "host0".to_string(),
                FcPort {
                    port_name: "100098f2b3a25ad6".to_string(),
                    node_name: None,
                },
            )]),
        );

        reconcile(&mut registry, &facts);
        let iface = registry.get("mds1").unwrap().interfaces.get("fc2/9").unwrap();
        assert_eq!(iface.hostname.as_deref(), Some("db01"));
        assert_eq!(iface.new_description.as_deref(), Some("Cust: db01 host0"));
    }

    #[test]
    fn test_host_lldp_overwrites_and_mac_passes_fill_only() {
        let mut sw = switch("sw1", &["Eth1/1", "Eth1/2"]);
        sw.mactable = vec![mac("aaaaaaaaaaaa", "Eth1/1"), mac("bbbbbbbbbbbb", "Eth1/2")];
        let mut registry: Registry = [sw].into_iter().collect();

        let mut facts = HostFacts::default();
        facts.lldp.push(HostLldpObservation {
            switchname: "sw1".to_string(),
            switchport: "Eth1/1".to_string(),
            hostname: "web01.example.com".to_string(),
            hostport: "eth0".to_string(),
        });
        facts.networking.insert(
            "web99".to_string(),
            BTreeMap::from([(
                "eno1".to_string(),
                NetworkingInterface {
                    mac: "aaaaaaaaaaaa".to_string(),
                },
            )]),
        );
        facts.ipmi.insert(
            "web02".to_string(),
            vec![IpmiInterface {
                mac: "bbbbbbbbbbbb".to_string(),
            }],
        );

        reconcile(&mut registry, &facts);
        assert_eq!(label(&registry, "sw1", "Eth1/1").as_deref(), Some("Cust: web01 eth0"));
        assert_eq!(label(&registry, "sw1", "Eth1/2").as_deref(), Some("Cust: web02 lom"));
    }

    fn core_pair() -> Registry {
        let mut sw1 = switch("sw1", &["Eth1/49", "Eth1/50", "mgmt0"]);
        sw1.lldp = vec![
            LldpNeighbor {
                switchport: "Eth1/49".to_string(),
                hostname: Some("core-sw2".to_string()),
                hostport: Some("Eth2/1".to_string()),
            },
            LldpNeighbor {
                switchport: "Eth1/50".to_string(),
                hostname: Some("unknown-sw".to_string()),
                hostport: Some("Eth1/1".to_string()),
            },
        ];
        let sw2 = switch("core-sw2", &["Eth2/1"]);
        [sw1, sw2].into_iter().collect()
    }

    #[test]
    fn test_switch_links_are_symmetric() {
        let mut registry = core_pair();
        reconcile(&mut registry, &HostFacts::default());

        assert_eq!(label(&registry, "sw1", "Eth1/49").as_deref(), Some("Core: core-sw2 Eth2/1"));
        assert_eq!(label(&registry, "core-sw2", "Eth2/1").as_deref(), Some("Core: sw1 Eth1/49"));
        assert_eq!(label(&registry, "sw1", "Eth1/50"), None);
    }

    #[test]
    fn test_mgmt_port_is_never_labeled() {
        let mut registry = core_pair();
        let mut facts = HostFacts::default();
        facts.lldp.push(HostLldpObservation {
            switchname: "sw1".to_string(),
            switchport: "mgmt0".to_string(),
            hostname: "oob-sw".to_string(),
            hostport: "ge-0/0/1".to_string(),
        });

        reconcile(&mut registry, &facts);
        let mgmt = registry.get("sw1").unwrap().interfaces.get("mgmt0").unwrap();
        assert_eq!(mgmt.hostname.as_deref(), Some("oob-sw"));
        assert_eq!(mgmt.new_description, None);
    }

    #[test]
    fn test_switch_links_from_text_lldp_are_symmetric() {
        let mut sw1 = switch("sw1", &["Eth1/49"]);
        sw1.lldp = crate::parsers::nxos::parse_lldp(
            "sw1",
            "Chassis id: 00de.fbee.0100\nPort id: Eth2/1\nLocal Port id: Eth1/49\nPort Description: uplink to sw1\nSystem Name: core-sw2\n",
        );
        let mut registry: Registry = [sw1, switch("core-sw2", &["Eth2/1"])].into_iter().collect();

        reconcile(&mut registry, &HostFacts::default());
        assert_eq!(label(&registry, "sw1", "Eth1/49").as_deref(), Some("Core: core-sw2 Eth2/1"));
        assert_eq!(label(&registry, "core-sw2", "Eth2/1").as_deref(), Some("Core: sw1 Eth1/49"));
    }

    #[test]
    fn test_networking_labels_port_with_nic_name() {
        let mut sw = switch("sw1", &["Eth1/1"]);
        sw.mactable = vec![mac("aaaaaaaaaaaa", "Eth1/1")];
        let mut registry: Registry = [sw].into_iter().collect();

        let mut facts = HostFacts::default();
        facts.networking.insert(
            "web09.example.com".to_string(),
            BTreeMap::from([(
                "eno1".to_string(),
                NetworkingInterface {
                    mac: "aaaaaaaaaaaa".to_string(),
                },
            )]),
        );

        reconcile(&mut registry, &facts);
        assert_eq!(label(&registry, "sw1", "Eth1/1").as_deref(), Some("Cust: web09 eno1"));
    }

    #[test]
    fn test_ipmi_wins_over_networking_on_same_port() {
        let mut sw = switch("sw1", &["Eth1/1"]);
        sw.mactable = vec![mac("aaaaaaaaaaaa", "Eth1/1")];
        let mut registry: Registry = [sw].into_iter().collect();

        let mut facts = HostFacts::default();
        facts.ipmi.insert(
            "web09".to_string(),
            vec![IpmiInterface {
                mac: "aaaaaaaaaaaa".to_string(),
            }],
        );
        facts.networking.insert(
            "web10".to_string(),
            BTreeMap::from([(
                "eno1".to_string(),
                NetworkingInterface {
                    mac: "aaaaaaaaaaaa".to_string(),
                },
            )]),
        );

        reconcile(&mut registry, &facts);
        assert_eq!(label(&registry, "sw1", "Eth1/1").as_deref(), Some("Cust: web09 lom"));
    }

    #[test]
    fn test_reconcile_is_idempotent_on_fresh_registries() {
        let mut facts = HostFacts::default();
        facts.lldp.push(HostLldpObservation {
            switchname: "core-sw2".to_string(),
            switchport: "Eth2/1".to_string(),
            hostname: "web05".to_string(),
            hostport: "eth1".to_string(),
        });

        let run = || {
            let mut registry = core_pair();
            reconcile(&mut registry, &facts);
            registry
                .iter()
                .flat_map(|(_, s)| s.interfaces.iter().map(|i| (i.name.clone(), i.new_description.clone())))
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());
        assert!(first.contains(&("Eth2/1".to_string(), Some("Cust: web05 eth1".to_string()))));
    }
}
