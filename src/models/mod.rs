mod device_family;
mod facts;
mod switch;

pub use device_family::DeviceFamily;
pub use facts::*;
pub use switch::*;

/// Canonical port identifiers with special meaning
pub mod well_known_port {
    /// Out-of-band management interface. Never labeled; its neighbor data is
    /// not trusted.
    pub const MGMT: &str = "mgmt0";
    /// Host port recorded for BMC/IPMI attachments
    pub const LOM: &str = "lom";
}

/// Canonical label prefixes
pub mod label_kind {
    pub const CUST: &str = "Cust";
    pub const CORE: &str = "Core";
    pub const STACK_SUFFIX: &str = " [STACK]";
}
