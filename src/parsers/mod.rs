pub mod comware;
pub mod lldpcli;
pub mod nxos;
