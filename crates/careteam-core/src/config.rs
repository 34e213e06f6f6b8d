//! Runtime configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Special path understood by [`crate::Database::open`] as "in memory".
pub const IN_MEMORY: &str = ":memory:";

/// Core configuration, usually read from a JSON file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file; `:memory:` for a throwaway database
    pub database_path: PathBuf,
    /// How long SQLite waits on a locked database before giving up
    pub busy_timeout_ms: u64,
    /// How long an operation waits for the shared connection
    pub lock_timeout_ms: u64,
    pub bootstrap_admin: BootstrapAdmin,
    pub credential_rule: CredentialRule,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("careteam.db"),
            busy_timeout_ms: 2_000,
            lock_timeout_ms: 2_000,
            bootstrap_admin: BootstrapAdmin::default(),
            credential_rule: CredentialRule::default(),
        }
    }
}

impl CoreConfig {
    /// Defaults with an in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_path: PathBuf::from(IN_MEMORY),
            ..Self::default()
        }
    }

    pub fn with_database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid careteam configuration")
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

/// The account guaranteed to exist on first run and after a reset.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BootstrapAdmin {
    pub username: String,
    pub credential: String,
    pub name: String,
    pub email: String,
}

impl Default for BootstrapAdmin {
    fn default() -> Self {
        Self {
            username: "admin".into(),
            credential: "admin123".into(),
            name: "Administrator".into(),
            email: "admin@hms.com".into(),
        }
    }
}

/// Shape a new credential must have.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialRule {
    /// Exactly `digits` ASCII digits (phone-number style)
    PhoneDigits { digits: usize },
    /// Any secret at least `min` characters long
    MinLength { min: usize },
}

impl Default for CredentialRule {
    fn default() -> Self {
        CredentialRule::PhoneDigits { digits: 10 }
    }
}
