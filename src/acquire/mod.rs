use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep, Duration};

use crate::config::{Config, PuppetDbHost, SwitchConnectOptions};
use crate::drivers::{DeviceDriver, RawKind};
use crate::error::{Error, Result};
use crate::facts::FactKind;
use crate::models::SwitchSnapshot;
use crate::utils::{list_files, ssh_run_commands_async, ssh_run_interactive_async, SshTarget};

/// Connection attempts per device before it is given up
const SSH_ATTEMPTS: u64 = 3;

/// Result of handing rendered lines to a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Lines applied and the running configuration persisted
    Saved,
    /// Lines sent, but the family has no known persistence command
    NotSaved,
}

pub fn ssh_target_for_switch(options: &SwitchConnectOptions, timeout_secs: u64) -> SshTarget {
    SshTarget {
        host: options.host().to_string(),
        port: options.port,
        user: options.username.clone(),
        password: options.password.clone(),
        timeout_secs,
    }
}

fn ssh_target_for_puppetdb(host: &PuppetDbHost, timeout_secs: u64) -> SshTarget {
    let user = host
        .username
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "root".to_string());
    SshTarget {
        host: host.host.clone(),
        port: host.port,
        user,
        password: host.password.clone(),
        timeout_secs,
    }
}

/// Run commands over one session, retrying the whole session on failure
async fn run_with_retries(target: &SshTarget, commands: &[String]) -> Result<Vec<String>> {
    let mut last_error = None;
    for attempt in 1..=SSH_ATTEMPTS {
        match ssh_run_commands_async(target.clone(), commands.to_vec()).await {
            Ok(outputs) => return Ok(outputs),
            Err(e) => {
                tracing::warn!("SSH attempt {} failed for {}: {}", attempt, target.host, e);
                last_error = Some(e);
                if attempt < SSH_ATTEMPTS {
                    sleep(Duration::from_secs(attempt * 5)).await;
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| Error::session(&target.host, "no attempt made")))
}

/// Spawn one task per item, at most `limit` at a time, and count failures
async fn fan_out<T, F, Fut>(items: Vec<T>, limit: usize, run: F) -> usize
where
    T: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = (String, Result<()>)> + Send + 'static,
{
    fn tally(joined: Option<std::result::Result<(String, Result<()>), JoinError>>) -> usize {
        match joined {
            Some(Ok((_, Ok(())))) | None => 0,
            Some(Ok((name, Err(e)))) => {
                tracing::error!("{}: {}", name, e);
                1
            }
            Some(Err(e)) => {
                tracing::error!("acquisition task failed: {}", e);
                1
            }
        }
    }

    let mut tasks = JoinSet::new();
    let mut failures = 0;
    for item in items {
        if tasks.len() >= limit.max(1) {
            failures += tally(tasks.join_next().await);
        }
        tasks.spawn(run(item));
    }
    while let Some(joined) = tasks.join_next().await {
        failures += tally(Some(joined));
    }
    failures
}

/// Capture the raw outputs of one switch
pub async fn acquire_switch(options: SwitchConnectOptions, timeout_secs: u64) -> Result<SwitchSnapshot> {
    let name = options.device_name.clone();
    let driver = options.device_type.driver(&name)?;
    let flavor = options.device_type_flavor.as_str();

    let mut snapshot = SwitchSnapshot {
        device_name: name.clone(),
        device_type: options.device_type.clone(),
        device_type_flavor: options.device_type_flavor.clone(),
        acquired_at: Some(Utc::now()),
        raw_interfaces: String::new(),
        raw_flogi: String::new(),
        raw_lldp: String::new(),
        raw_mactable: String::new(),
    };

    let planned: Vec<(RawKind, String)> = RawKind::ALL
        .into_iter()
        .filter_map(|kind| driver.acquire_command(kind, flavor).map(|c| (kind, c.to_string())))
        .collect();
    if planned.is_empty() {
        tracing::info!("{}: device_type {} is not queried", name, options.device_type);
        return Ok(snapshot);
    }

    tracing::info!("Connecting to {} ({})", name, options.host());
    let target = ssh_target_for_switch(&options, timeout_secs);
    let commands: Vec<String> = planned.iter().map(|(_, c)| c.clone()).collect();
    let outputs = run_with_retries(&target, &commands).await?;

    for ((kind, _), text) in planned.into_iter().zip(outputs) {
        let slot = match kind {
            RawKind::Interfaces => &mut snapshot.raw_interfaces,
            RawKind::Flogi => &mut snapshot.raw_flogi,
            RawKind::Lldp => &mut snapshot.raw_lldp,
            RawKind::Mactable => &mut snapshot.raw_mactable,
        };
        *slot = text;
    }
    Ok(snapshot)
}

async fn write_snapshot(dir: &Path, snapshot: &SwitchSnapshot) -> Result<PathBuf> {
    let path = dir.join(format!("{}.json", snapshot.device_name));
    let doc = serde_json::to_string_pretty(snapshot).map_err(|e| Error::json(&path, e))?;
    tokio::fs::write(&path, doc).await.map_err(|e| Error::io(&path, e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}

/// Acquire every inventory switch into `<data>/switches/`. Returns the
/// number of switches that failed.
pub async fn acquire_switches(
    config: &Config,
    inventory: BTreeMap<String, SwitchConnectOptions>,
) -> Result<usize> {
    let dir = config.switches_dir();
    tokio::fs::create_dir_all(&dir).await.map_err(|e| Error::io(&dir, e))?;

    let total = inventory.len();
    let timeout_secs = config.ssh_timeout_secs;
    let failures = fan_out(
        inventory.into_values().collect(),
        config.acquire_concurrency,
        |options: SwitchConnectOptions| {
            let dir = dir.clone();
            async move {
                let name = options.device_name.clone();
                let result: Result<()> = async {
                    let snapshot = acquire_switch(options, timeout_secs).await?;
                    write_snapshot(&dir, &snapshot).await?;
                    Ok(())
                }
                .await;
                (name, result)
            }
        },
    )
    .await;

    tracing::info!("Acquired {} of {} switches", total - failures, total);
    Ok(failures)
}

/// Remote command fetching all active nodes' values of one fact
pub fn puppetdb_query_command(query_url: &str, kind: FactKind) -> String {
    format!(
        r#"curl -sS -G {} --data-urlencode 'query=["and",["=","node_state","active"],["=","name","{}"]]'"#,
        query_url,
        kind.as_str()
    )
}

/// Remove the documents of a previous run
fn clean_facts_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    for path in list_files(dir, ".json")? {
        std::fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
    }
    Ok(())
}

async fn acquire_puppetdb_host(host: PuppetDbHost, dir: PathBuf, query_url: String, timeout_secs: u64) -> Result<()> {
    tracing::info!("Connecting to {}", host.host);
    let target = ssh_target_for_puppetdb(&host, timeout_secs);
    let commands: Vec<String> = FactKind::ALL
        .iter()
        .map(|kind| puppetdb_query_command(&query_url, *kind))
        .collect();
    let outputs = run_with_retries(&target, &commands).await?;

    for (kind, doc) in FactKind::ALL.iter().zip(outputs) {
        let path = dir.join(format!("{}{}", host.host, kind.file_suffix()));
        serde_json::from_str::<serde_json::Value>(&doc).map_err(|e| Error::json(&path, e))?;
        tokio::fs::write(&path, doc).await.map_err(|e| Error::io(&path, e))?;
        tracing::debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Fetch every fact kind from every fact-store host into `<data>/puppetdb/`.
/// Returns the number of hosts that failed.
pub async fn acquire_puppetdb(config: &Config, hosts: Vec<PuppetDbHost>) -> Result<usize> {
    let dir = config.facts_dir();
    clean_facts_dir(&dir)?;

    let total = hosts.len();
    let timeout_secs = config.ssh_timeout_secs;
    let query_url = config.puppetdb_query_url.clone();
    let failures = fan_out(hosts, config.acquire_concurrency, |host: PuppetDbHost| {
        let name = host.host.clone();
        let fetch = acquire_puppetdb_host(host, dir.clone(), query_url.clone(), timeout_secs);
        async move { (name, fetch.await) }
    })
    .await;

    tracing::info!("Acquired facts from {} of {} hosts", total - failures, total);
    Ok(failures)
}

/// The full line sequence typed into the device for one push
pub fn push_sequence(driver: &dyn DeviceDriver, lines: &[String]) -> (Vec<String>, PushOutcome) {
    match driver.config_session() {
        Some(session) => {
            let mut sequence = Vec::with_capacity(lines.len() + 4);
            sequence.push(session.enter.to_string());
            sequence.extend(lines.iter().cloned());
            sequence.push(session.exit.to_string());
            sequence.push(session.save.to_string());
            sequence.push(session.logout.to_string());
            (sequence, PushOutcome::Saved)
        }
        None => (lines.to_vec(), PushOutcome::NotSaved),
    }
}

/// Apply rendered lines to a switch and persist them
pub async fn push_configuration(
    options: &SwitchConnectOptions,
    driver: &dyn DeviceDriver,
    lines: &[String],
    timeout_secs: u64,
) -> Result<PushOutcome> {
    let (sequence, outcome) = push_sequence(driver, lines);
    let target = ssh_target_for_switch(options, timeout_secs);

    tracing::info!("Pushing {} lines to {}", lines.len(), options.device_name);
    let output = ssh_run_interactive_async(target, sequence).await?;
    for line in output.lines() {
        tracing::info!("{}: {}", options.device_name, line);
    }

    if outcome == PushOutcome::NotSaved {
        tracing::error!(
            "{}: configuration not saved, as device_type {} is unhandled",
            options.device_name,
            options.device_type
        );
    }
    Ok(outcome)
}
