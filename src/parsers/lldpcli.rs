use crate::models::HostLldpObservation;

/// Parse `lldpcli show neighbors` captured on a host.
///
/// ```text
/// -------------------------------------------------------------------------------
/// Interface:    eth0, via: LLDP, RID: 1, Time: 12 days, 02:07:41
///   Chassis:
///     SysName:      sw1.example.com
///   Port:
///     PortID:       ifname Ethernet1/4
/// -------------------------------------------------------------------------------
/// ```
///
/// A neighbor is emitted when its closing separator is reached and both the
/// switch name and switch port were seen.
pub fn parse_lldpcli(hostname: &str, text: &str) -> Vec<HostLldpObservation> {
    struct Pending {
        hostport: String,
        switchname: Option<String>,
        switchport: Option<String>,
    }

    let mut observations = Vec::new();
    let mut current: Option<Pending> = None;

    for line in text.lines() {
        let line = line.trim();
        let words: Vec<&str> = line.split_whitespace().collect();

        if line.starts_with("Interface:") {
            if let Some(hostport) = words.get(1) {
                current = Some(Pending {
                    hostport: hostport.trim_end_matches(',').to_string(),
                    switchname: None,
                    switchport: None,
                });
            }
        } else if line.starts_with("---") {
            if let Some(Pending {
                hostport,
                switchname: Some(switchname),
                switchport: Some(switchport),
            }) = current.take()
            {
                observations.push(HostLldpObservation {
                    switchname,
                    switchport,
                    hostname: hostname.to_string(),
                    hostport,
                });
            }
        } else if let Some(pending) = current.as_mut() {
            if line.starts_with("SysName:") {
                pending.switchname = words.get(1).map(|s| s.to_string());
            } else if line.starts_with("PortID:") {
                pending.switchport = words.get(2).map(|s| s.to_string());
            }
        }
    }

    observations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lldpcli() {
        let text = "\
-------------------------------------------------------------------------------
LLDP neighbors:
-------------------------------------------------------------------------------
Interface:    eth0, via: LLDP, RID: 1, Time: 12 days, 02:07:41
  Chassis:
    ChassisID:    mac 00:de:fb:ee:ab:00
    SysName:      sw1.example.com
  Port:
    PortID:       ifname Ethernet1/4
    PortDescr:    Ethernet1/4
-------------------------------------------------------------------------------
Interface:    eth1, via: LLDP, RID: 2, Time: 12 days, 02:07:41
  Chassis:
    ChassisID:    mac 00:de:fb:ee:ab:01
  Port:
    PortID:       ifname Ethernet1/5
-------------------------------------------------------------------------------
";
        let observations = parse_lldpcli("web01.example.com", text);
        assert_eq!(
            observations,
            vec![HostLldpObservation {
                switchname: "sw1.example.com".to_string(),
                switchport: "Ethernet1/4".to_string(),
                hostname: "web01.example.com".to_string(),
                hostport: "eth0".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_lldpcli_without_closing_separator() {
        let text = "Interface: eth0, via: LLDP\n  SysName: sw1\n  PortID: ifname Eth1/1\n";
        assert!(parse_lldpcli("web01", text).is_empty());
    }
}
