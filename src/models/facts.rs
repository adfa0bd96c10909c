use std::collections::BTreeMap;

/// One Fibre Channel HBA port of a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcPort {
    pub port_name: String,
    pub node_name: Option<String>,
}

/// One BMC network interface of a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpmiInterface {
    pub mac: String,
}

/// One physical network interface of a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkingInterface {
    pub mac: String,
}

/// A switch port as seen from the host side via LLDP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLldpObservation {
    pub switchname: String,
    pub switchport: String,
    pub hostname: String,
    pub hostport: String,
}

/// host -> FC host id ("host0") -> port
pub type FcHosts = BTreeMap<String, BTreeMap<String, FcPort>>;

/// host -> BMC interfaces
pub type IpmiHosts = BTreeMap<String, Vec<IpmiInterface>>;

/// host -> interface name -> interface
pub type NetworkingHosts = BTreeMap<String, BTreeMap<String, NetworkingInterface>>;

/// HostFacts bundles every host-side input of one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct HostFacts {
    pub fc: FcHosts,
    pub ipmi: IpmiHosts,
    pub lldp: Vec<HostLldpObservation>,
    pub networking: NetworkingHosts,
}
