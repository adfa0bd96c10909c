use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Normalize a hardware address (MAC or WWN) to contiguous lower-case hex.
/// e.g. "00de.fbee.abab", "5C-8A-38-28-71-A8", "20:4b:00:de:fb:ee:ab:c0"
pub fn normalize_hex(addr: &str) -> String {
    let addr = addr.trim();
    let addr = addr.strip_prefix("0x").unwrap_or(addr);
    addr.chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_lowercase()
}

/// Short hostname: everything before the first '.'
pub fn strip_domain(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Number of leading spaces on a line
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Files in `dir` with the given suffix, sorted by name
pub fn list_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Where and how to open an SSH session
#[derive(Debug, Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Password auth (plus keyboard-interactive); agent auth when absent
    pub password: Option<String>,
    pub timeout_secs: u64,
}

/// libssh2 session timeout in milliseconds, saturating at `u32::MAX`
fn timeout_millis(secs: u64) -> u32 {
    u32::try_from(secs).unwrap_or(u32::MAX).saturating_mul(1000)
}

/// Create an SSH session and authenticate with password + keyboard-interactive,
/// or with the local agent when no password is configured.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(target: &SshTarget) -> Result<ssh2::Session> {
    let host = target.host.as_str();
    let addr = (host, target.port)
        .to_socket_addrs()
        .map_err(|e| Error::session(host, format!("cannot resolve address: {}", e)))?
        .next()
        .ok_or_else(|| Error::session(host, "address resolved to nothing"))?;

    let timeout = Duration::from_secs(target.timeout_secs);
    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| Error::session(host, format!("TCP connection failed: {}", e)))?;

    tcp.set_read_timeout(Some(timeout)).ok();
    tcp.set_write_timeout(Some(timeout)).ok();

    let mut session = ssh2::Session::new()
        .map_err(|e| Error::session(host, format!("failed to create SSH session: {}", e)))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout_millis(target.timeout_secs));
    session
        .handshake()
        .map_err(|e| Error::session(host, format!("SSH handshake failed: {}", e)))?;

    match &target.password {
        Some(password) => {
            // Try password auth first
            match session.userauth_password(&target.user, password) {
                Ok(_) if session.authenticated() => return Ok(session),
                _ => {}
            }

            // Keyboard-interactive is what Comware and some NX-OS AAA setups offer
            let mut prompter = PasswordPrompt {
                password: password.clone(),
            };
            let _ = session.userauth_keyboard_interactive(&target.user, &mut prompter);
        }
        None => {
            let _ = session.userauth_agent(&target.user);
        }
    }

    if session.authenticated() {
        Ok(session)
    } else {
        Err(Error::session(host, "authentication failed: all methods exhausted"))
    }
}

/// Execute one command on an open session and return its output
fn ssh_exec_on_session(session: &ssh2::Session, host: &str, command: &str) -> Result<String> {
    let mut channel = session
        .channel_session()
        .map_err(|e| Error::session(host, format!("failed to open channel: {}", e)))?;

    channel
        .exec(command)
        .map_err(|e| Error::session(host, format!("failed to execute '{}': {}", command, e)))?;

    let mut output = String::new();
    channel
        .read_to_string(&mut output)
        .map_err(|e| Error::session(host, format!("failed to read output of '{}': {}", command, e)))?;

    channel
        .wait_close()
        .map_err(|e| Error::session(host, format!("failed to close channel: {}", e)))?;

    Ok(output)
}

/// Connect once and run each command on its own channel, returning the
/// outputs in command order.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_run_commands(target: &SshTarget, commands: &[String]) -> Result<Vec<String>> {
    let session = ssh_connect(target)?;
    commands
        .iter()
        .map(|command| ssh_exec_on_session(&session, &target.host, command))
        .collect()
}

/// Feed lines to an interactive shell (PTY), the way a CLI user would type
/// them, and return everything the device printed.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_run_interactive(target: &SshTarget, lines: &[String]) -> Result<String> {
    let host = target.host.as_str();
    let session = ssh_connect(target)?;

    let mut channel = session
        .channel_session()
        .map_err(|e| Error::session(host, format!("failed to open channel: {}", e)))?;
    channel
        .request_pty("vt100", None, Some((512, 24, 0, 0)))
        .map_err(|e| Error::session(host, format!("failed to request PTY: {}", e)))?;
    channel
        .shell()
        .map_err(|e| Error::session(host, format!("failed to start shell: {}", e)))?;

    for line in lines {
        channel
            .write_all(format!("{}\n", line).as_bytes())
            .map_err(|e| Error::session(host, format!("failed to send '{}': {}", line, e)))?;
    }
    channel.flush().ok();
    channel
        .send_eof()
        .map_err(|e| Error::session(host, format!("failed to send EOF: {}", e)))?;

    let mut output = String::new();
    channel
        .read_to_string(&mut output)
        .map_err(|e| Error::session(host, format!("failed to read output: {}", e)))?;
    let _ = channel.wait_close();

    Ok(output)
}

/// Async wrapper for ssh_run_commands - runs in a blocking thread pool
pub async fn ssh_run_commands_async(target: SshTarget, commands: Vec<String>) -> Result<Vec<String>> {
    let host = target.host.clone();
    tokio::task::spawn_blocking(move || ssh_run_commands(&target, &commands))
        .await
        .map_err(|e| Error::session(&host, format!("task join error: {}", e)))?
}

/// Async wrapper for ssh_run_interactive - runs in a blocking thread pool
pub async fn ssh_run_interactive_async(target: SshTarget, lines: Vec<String>) -> Result<String> {
    let host = target.host.clone();
    tokio::task::spawn_blocking(move || ssh_run_interactive(&target, &lines))
        .await
        .map_err(|e| Error::session(&host, format!("task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hex() {
        assert_eq!(normalize_hex("00de.fbee.abab"), "00defbeeabab");
        assert_eq!(normalize_hex("5C-8A-38-28-71-A8"), "5c8a382871a8");
        assert_eq!(normalize_hex("20:4b:00:de:fb:ee:ab:c0"), "204b00defbeeabc0");
        assert_eq!(normalize_hex("0x21000024ff3c5a10"), "21000024ff3c5a10");
        assert_eq!(normalize_hex("aabbccddeeff"), "aabbccddeeff");
    }

    #[test]
    fn test_strip_domain() {
        assert_eq!(strip_domain("web01.example.com"), "web01");
        assert_eq!(strip_domain("web01"), "web01");
        assert_eq!(strip_domain(""), "");
    }

    #[test]
    fn test_timeout_millis_saturates() {
        assert_eq!(timeout_millis(30), 30_000);
        assert_eq!(timeout_millis(5_000_000), u32::MAX);
        assert_eq!(timeout_millis(u64::MAX), u32::MAX);
    }

    #[test]
    fn test_indent_of() {
        assert_eq!(indent_of("fc2/11 is down"), 0);
        assert_eq!(indent_of("    Port WWN is 20:4b"), 4);
        assert_eq!(indent_of(" Ten-GigabitEthernet1/0/1 current state: UP"), 1);
        assert_eq!(indent_of(""), 0);
    }
}
