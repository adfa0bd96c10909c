use anyhow::{bail, Context};
use std::io::Write;

use crate::acquire::{push_configuration, PushOutcome};
use crate::config::{read_switch_connect_options, Config};
use crate::error::{Error, Result};
use crate::facts::read_host_facts;
use crate::models::{DeviceFamily, Registry};
use crate::reconcile::reconcile;
use crate::registry::read_switches;
use crate::render::flatten;

/// The configuration lines derived for one switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSwitch {
    pub device_name: String,
    pub device_type: DeviceFamily,
    pub lines: Vec<String>,
}

/// Build the registry from the data directory and derive every label
pub fn prepare(config: &Config) -> Result<Registry> {
    let mut registry = read_switches(&config.switches_dir())?;
    let facts = read_host_facts(&config.facts_dir(), &config.lldpcli_dir())?;
    reconcile(&mut registry, &facts);
    Ok(registry)
}

/// Render every switch. Switches without a driver are returned as errors
/// and do not stop the others.
pub fn render_registry(registry: &Registry) -> (Vec<RenderedSwitch>, Vec<Error>) {
    let mut rendered = Vec::new();
    let mut errors = Vec::new();
    for (name, switch) in registry.iter() {
        match switch.device_type.driver(name) {
            Ok(driver) => rendered.push(RenderedSwitch {
                device_name: name.clone(),
                device_type: switch.device_type.clone(),
                lines: flatten(driver.render(&switch.interfaces)),
            }),
            Err(e) => errors.push(e),
        }
    }
    (rendered, errors)
}

/// Print the rendered lines of each switch under a `--- <switch>` header
pub fn write_dry_run(out: &mut impl Write, rendered: &[RenderedSwitch]) -> std::io::Result<()> {
    for switch in rendered {
        writeln!(out, "--- {}", switch.device_name)?;
        for line in &switch.lines {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

async fn apply(config: &Config, rendered: &[RenderedSwitch]) -> Result<usize> {
    let inventory = read_switch_connect_options(&config.switches_inventory())?;
    let mut failures = 0;

    for switch in rendered {
        if switch.lines.is_empty() {
            tracing::info!("{}: no label changes", switch.device_name);
            continue;
        }

        let result = async {
            let options = inventory
                .get(&switch.device_name)
                .ok_or_else(|| Error::MissingConnectOptions(switch.device_name.clone()))?;
            let driver = switch.device_type.driver(&switch.device_name)?;
            push_configuration(options, driver, &switch.lines, config.ssh_timeout_secs).await
        }
        .await;

        match result {
            Ok(PushOutcome::Saved) => tracing::info!("{}: configuration saved", switch.device_name),
            Ok(PushOutcome::NotSaved) => failures += 1,
            Err(e) => {
                tracing::error!("{}", e);
                failures += 1;
            }
        }
    }
    Ok(failures)
}

/// Run `configure` (dry run) or `configure-apply`
pub async fn run(config: &Config, apply_changes: bool) -> anyhow::Result<()> {
    let registry = prepare(config).context("failed to load switches and facts")?;
    let (rendered, errors) = render_registry(&registry);
    for e in &errors {
        tracing::error!("{}", e);
    }

    let mut failures = errors.len();
    if apply_changes {
        failures += apply(config, &rendered).await?;
    } else {
        let stdout = std::io::stdout();
        write_dry_run(&mut stdout.lock(), &rendered).context("failed to write configuration")?;
    }

    if failures > 0 {
        bail!("{} of {} switches could not be configured", failures, registry.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interface, Switch};

    fn labeled(name: &str, family: DeviceFamily, port: &str, label: &str) -> Switch {
        let mut switch = Switch::new(name, family);
        let mut iface = Interface::new(port);
        iface.media_type = Some("Ethernet".to_string());
        iface.new_description = Some(label.to_string());
        switch.interfaces.insert(iface);
        switch
    }

    #[test]
    fn test_unsupported_family_reported_others_rendered() {
        let registry: Registry = [
            labeled("sw1", DeviceFamily::CiscoNxos, "Eth1/1", "Cust: web01 eth0"),
            labeled("edge1", DeviceFamily::from("juniper_junos"), "ge-0/0/1", "Cust: x"),
            labeled("sw3", DeviceFamily::Unmanaged, "Eth1/1", "Cust: y"),
        ]
        .into_iter()
        .collect();

        let (rendered, errors) = render_registry(&registry);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], Error::UnsupportedDeviceFamily { device_name, .. } if device_name == "edge1"));

        let names: Vec<&str> = rendered.iter().map(|r| r.device_name.as_str()).collect();
        assert_eq!(names, vec!["sw1", "sw3"]);
        assert_eq!(rendered[0].lines.len(), 3);
        assert!(rendered[1].lines.is_empty());
    }

    #[test]
    fn test_dry_run_output() {
        let rendered = vec![
            RenderedSwitch {
                device_name: "sw1".to_string(),
                device_type: DeviceFamily::CiscoNxos,
                lines: vec![
                    "interface Eth1/1".to_string(),
                    "  description Cust: web01 eth0".to_string(),
                    "exit".to_string(),
                ],
            },
            RenderedSwitch {
                device_name: "sw2".to_string(),
                device_type: DeviceFamily::HpComware,
                lines: Vec::new(),
            },
        ];

        let mut out = Vec::new();
        write_dry_run(&mut out, &rendered).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "--- sw1\ninterface Eth1/1\n  description Cust: web01 eth0\nexit\n--- sw2\n"
        );
    }

    #[test]
    fn test_prepare_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load().with_data_dir(dir.path());
        std::fs::create_dir_all(config.switches_dir()).unwrap();
        std::fs::create_dir_all(config.facts_dir()).unwrap();

        let snapshot = serde_json::json!({
            "device_name": "sw1",
            "device_type": "cisco_nxos",
            "device_type_flavor": "",
            "raw_interfaces": "Ethernet1/1 is up\n  Description: old\nmgmt0 is up\n",
            "raw_flogi": "",
            "raw_lldp": "",
            "raw_mactable": ""
        });
        std::fs::write(config.switches_dir().join("sw1.json"), snapshot.to_string()).unwrap();
        std::fs::write(
            config.facts_dir().join("puppet1.lldp.json"),
            r#"[{"certname": "web01.example.com", "value": {"neighbors": {"eth0": {"sysname": "sw1", "portid": "ifname Ethernet1/1"}}}}]"#,
        )
        .unwrap();

        let registry = prepare(&config).unwrap();
        let (rendered, errors) = render_registry(&registry);
        assert!(errors.is_empty());
        assert_eq!(
            rendered[0].lines,
            vec![
                "interface Eth1/1".to_string(),
                "#   before: old".to_string(),
                "  description Cust: web01 eth0".to_string(),
                "exit".to_string(),
            ]
        );
    }
}
