//! Sync target configuration
//!
//! One [`SyncSettings`] record describes a single local/remote pair and
//! how to reach it. The record is plain data: loading and saving it is
//! the only I/O in this crate, and a loaded record is cloned into each
//! sync run so that edits never race an in-flight cycle.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_ssh_port() -> u16 {
    22
}

/// Configuration for one synchronization target.
///
/// String fields use the empty string for "unset" so the TOML file
/// stays flat and every field can be edited in place. Missing fields
/// deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Path to the rsync binary; empty means a bare `rsync` resolved
    /// from `PATH`
    pub binary_path: String,
    /// Hostname or IP of the remote machine
    pub remote_host: String,
    /// SSH port on the remote machine
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    /// SSH login user
    pub ssh_username: String,
    /// SSH password. Insecure: the password ends up on the rsync
    /// command line where other local processes can read it. Prefer
    /// `private_key_path`.
    pub ssh_password: String,
    /// Path to an SSH private key; takes precedence over the password
    pub private_key_path: String,
    /// Local directory root to synchronize
    pub local_dir_path: String,
    /// Remote directory root to synchronize
    pub remote_dir_path: String,
    /// Path globs that flow remote-to-local only. An ordinary push
    /// excludes them; an empty list disables the pull phase entirely.
    pub pull_paths: Vec<String>,
    /// Path globs excluded from both directions, applied verbatim
    pub exclude_patterns: Vec<String>,
    /// Simulate without touching the filesystem
    pub dry_run: bool,
    /// rsync log file path; empty means no log file
    pub log_file_path: String,
    /// Minutes between scheduled sync cycles; zero or negative
    /// disables the scheduler
    pub schedule_interval: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            binary_path: String::new(),
            remote_host: String::new(),
            ssh_port: default_ssh_port(),
            ssh_username: String::new(),
            ssh_password: String::new(),
            private_key_path: String::new(),
            local_dir_path: String::new(),
            remote_dir_path: String::new(),
            pull_paths: Vec::new(),
            exclude_patterns: Vec::new(),
            dry_run: false,
            log_file_path: String::new(),
            schedule_interval: 0,
        }
    }
}

impl SyncSettings {
    /// Load settings from a TOML file.
    ///
    /// Fields absent from the file take their defaults, so older
    /// config files keep working after new fields are added.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, Some(path.to_path_buf()), "read settings"))?;
        toml::from_str(&raw).map_err(|e| Error::config(format!("invalid settings file: {e}")))
    }

    /// Save settings as TOML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io(e, Some(parent.to_path_buf()), "create config dir"))?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(path, raw)
            .map_err(|e| Error::io(e, Some(path.to_path_buf()), "write settings"))
    }

    /// Default location for the settings file
    /// (`$XDG_CONFIG_HOME/vaultsync/config.toml` on Linux).
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("vaultsync").join("config.toml"))
            .ok_or_else(|| Error::config("could not determine a config directory"))
    }

    /// True when password authentication is configured and no private
    /// key overrides it.
    pub fn uses_password_auth(&self) -> bool {
        !self.ssh_password.is_empty() && self.private_key_path.is_empty()
    }
}
