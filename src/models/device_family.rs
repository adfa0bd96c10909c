use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor/platform family of a switch, selecting its parsers, renderer and
/// session commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceFamily {
    /// Cisco NX-OS ("show interface" style output)
    CiscoNxos,
    /// HPE Comware ("display interface" style output)
    HpComware,
    /// Listed in the inventory but deliberately never parsed nor rendered
    Unmanaged,
    /// Any other family; accepted on input, rejected when a driver is needed
    Unsupported(String),
}

impl DeviceFamily {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceFamily::CiscoNxos => "cisco_nxos",
            DeviceFamily::HpComware => "hp_comware",
            DeviceFamily::Unmanaged => "none",
            DeviceFamily::Unsupported(other) => other,
        }
    }
}

impl From<String> for DeviceFamily {
    fn from(s: String) -> Self {
        match s.as_str() {
            "cisco_nxos" => DeviceFamily::CiscoNxos,
            "hp_comware" => DeviceFamily::HpComware,
            "none" => DeviceFamily::Unmanaged,
            _ => DeviceFamily::Unsupported(s),
        }
    }
}

impl From<&str> for DeviceFamily {
    fn from(s: &str) -> Self {
        DeviceFamily::from(s.to_string())
    }
}

impl From<DeviceFamily> for String {
    fn from(family: DeviceFamily) -> Self {
        family.as_str().to_string()
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
