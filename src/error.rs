use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for switchportlabel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural failures that abort a run (or a single device's step).
///
/// Reference-not-found conditions are never represented here: they are
/// logged and skipped inside the reconciliation passes.
#[derive(Debug, Error)]
pub enum Error {
    /// A required file or directory could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A snapshot or fact document is not valid JSON of the expected shape.
    #[error("malformed JSON document {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An inventory file is not valid TOML of the expected shape.
    #[error("malformed inventory {}: {source}", path.display())]
    Inventory {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// No driver exists for the switch's device family.
    #[error("unsupported device_type '{device_type}' for switch {device_name}")]
    UnsupportedDeviceFamily {
        device_name: String,
        device_type: String,
    },

    /// A switch is being applied but the inventory has no entry for it.
    #[error("switch {0} has no connection options in the inventory")]
    MissingConnectOptions(String),

    /// SSH connection, authentication or command execution failed.
    #[error("SSH session to {host} failed: {message}")]
    Session { host: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn session(host: &str, message: impl Into<String>) -> Self {
        Self::Session {
            host: host.to_string(),
            message: message.into(),
        }
    }
}
