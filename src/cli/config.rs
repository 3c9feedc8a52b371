use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Console settings loaded from `--config`. Transport timing is fixed and
/// deliberately absent here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Port to use when none is given on the command line
    #[serde(default)]
    pub port: Option<String>,
    /// Name used by `:ssid` without an argument
    #[serde(default = "default_fake_ssid")]
    pub fake_ssid: String,
    /// How long `--send` keeps printing device output, in milliseconds
    #[serde(default = "default_listen_ms")]
    pub listen_ms: u64,
}

fn default_fake_ssid() -> String {
    "Free WiFi".to_string()
}

fn default_listen_ms() -> u64 {
    3000
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            port: None,
            fake_ssid: default_fake_ssid(),
            listen_ms: default_listen_ms(),
        }
    }
}

impl ConsoleConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Read configuration from a file
    pub fn from_file(file_path: impl AsRef<Path>) -> Result<Self> {
        let path = file_path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
