use crate::models::{Interface, InterfaceTable};

/// Configuration lines for one port, from interface entry to exit
pub type Stanza = Vec<String>;

/// Media type whose label command differs on NX-OS
const FIBRE_CHANNEL: &str = "Fibre Channel";

/// The label to set, when it is non-empty and differs from the configured one.
/// A port losing its label keeps whatever is configured.
fn changed_label(iface: &Interface) -> Option<&str> {
    let new = iface.new_description.as_deref().filter(|d| !d.is_empty())?;
    (iface.description.as_deref() != Some(new)).then_some(new)
}

/// Render label changes for a Cisco NX-OS switch
pub fn render_nxos(interfaces: &InterfaceTable) -> Vec<Stanza> {
    interfaces
        .iter()
        .filter_map(|iface| {
            let label = changed_label(iface)?;
            let command = if iface.media_type.as_deref() == Some(FIBRE_CHANNEL) {
                "switchport description"
            } else {
                "description"
            };

            let mut lines = vec![format!("interface {}", iface.name)];
            if let Some(before) = iface.description.as_deref().filter(|d| !d.is_empty()) {
                lines.push(format!("#   before: {}", before));
            }
            lines.push(format!("  {} {}", command, label));
            lines.push("exit".to_string());
            Some(lines)
        })
        .collect()
}

/// Render label changes for an HPE Comware switch
pub fn render_comware(interfaces: &InterfaceTable) -> Vec<Stanza> {
    interfaces
        .iter()
        .filter_map(|iface| {
            let label = changed_label(iface)?;

            let mut lines = vec![format!("interface {}", iface.name)];
            if let Some(before) = iface.description.as_deref().filter(|d| !d.is_empty()) {
                lines.push(format!("  # before: {}", before));
            }
            lines.push(format!("  description {}", label));
            lines.push("quit".to_string());
            Some(lines)
        })
        .collect()
}

/// Concatenate stanzas into the line sequence pushed to (or printed for) a
/// switch
pub fn flatten(stanzas: Vec<Stanza>) -> Vec<String> {
    stanzas.into_iter().flatten().collect()
}
