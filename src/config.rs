use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::format::TRUNCATION_MARKER;

/// Environment variable consulted when `api.token` is left empty.
pub const TOKEN_ENV_VAR: &str = "FMRELAY_API_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransmitMode {
    /// Only log what would be broadcast
    #[default]
    Log,
    /// Pipe each line into an external command
    Command,
}

impl std::fmt::Display for TransmitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransmitMode::Log => write!(f, "log"),
            TransmitMode::Command => write!(f, "command"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default = "default_poller_config")]
    pub poller: PollerConfig,
    #[serde(default = "default_log_config")]
    pub log: LogConfig,
    #[serde(default = "default_transmitter_config")]
    pub transmitter: TransmitterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub url: String,
    #[serde(default)]
    pub token: String,
    pub group_id: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Replay each batch oldest-first, assuming the API answers newest-first
    #[serde(default = "default_reverse_order")]
    pub reverse_order: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransmitterConfig {
    #[serde(default)]
    pub mode: TransmitMode,
    #[serde(default = "default_frequency_mhz")]
    pub frequency_mhz: f64,
    /// Shell command for `mode = "command"`; `{frequency}` is substituted
    #[serde(default)]
    pub command: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    5
}

fn default_reverse_order() -> bool {
    true
}

fn default_log_path() -> PathBuf {
    PathBuf::from("messages_log.txt")
}

fn default_max_line_length() -> usize {
    300
}

fn default_frequency_mhz() -> f64 {
    100.1
}

fn default_poller_config() -> PollerConfig {
    PollerConfig {
        interval_secs: default_interval_secs(),
        reverse_order: default_reverse_order(),
    }
}

fn default_log_config() -> LogConfig {
    LogConfig {
        path: default_log_path(),
        max_line_length: default_max_line_length(),
    }
}

fn default_transmitter_config() -> TransmitterConfig {
    TransmitterConfig {
        mode: TransmitMode::default(),
        frequency_mhz: default_frequency_mhz(),
        command: None,
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate config text. An empty `api.token` is filled from
    /// `FMRELAY_API_TOKEN` when that variable is set.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).context("Failed to parse config file")?;

        if config.api.token.is_empty() {
            if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
                config.api.token = token;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api.url.trim().is_empty() {
            anyhow::bail!("api.url must not be empty");
        }
        if self.api.group_id.trim().is_empty() {
            anyhow::bail!("api.group_id must not be empty");
        }
        if self.api.limit == 0 {
            anyhow::bail!("api.limit must be at least 1");
        }
        if self.log.max_line_length <= TRUNCATION_MARKER.chars().count() {
            anyhow::bail!(
                "log.max_line_length must be greater than {}",
                TRUNCATION_MARKER.chars().count()
            );
        }
        if self.transmitter.mode == TransmitMode::Command
            && self
                .transmitter
                .command
                .as_deref()
                .map_or(true, |c| c.trim().is_empty())
        {
            anyhow::bail!("transmitter.command is required when mode = \"command\"");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poller.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[api]
url = "https://chat.example/api/v1/fm/get-chat"
token = "secret"
group_id = "group-42"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.api.page, 1);
        assert_eq!(config.api.limit, 10);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.poller.interval_secs, 5);
        assert!(config.poller.reverse_order);
        assert_eq!(config.log.path, PathBuf::from("messages_log.txt"));
        assert_eq!(config.log.max_line_length, 300);
        assert_eq!(config.transmitter.mode, TransmitMode::Log);
        assert!((config.transmitter.frequency_mhz - 100.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_full_config() {
        let text = r#"
[api]
url = "https://chat.example/api"
token = "t"
group_id = "g"
page = 2
limit = 25
timeout_secs = 3

[poller]
interval_secs = 30
reverse_order = false

[log]
path = "/var/log/fmrelay.txt"
max_line_length = 120

[transmitter]
mode = "command"
frequency_mhz = 88.5
command = "cat > /dev/null"
"#;
        let config = Config::parse(text).unwrap();
        assert_eq!(config.api.page, 2);
        assert_eq!(config.api.limit, 25);
        assert_eq!(config.poller.interval_secs, 30);
        assert!(!config.poller.reverse_order);
        assert_eq!(config.log.max_line_length, 120);
        assert_eq!(config.transmitter.mode, TransmitMode::Command);
        assert_eq!(
            config.transmitter.command.as_deref(),
            Some("cat > /dev/null")
        );
    }

    #[test]
    fn test_command_mode_requires_command() {
        let text = format!("{}\n[transmitter]\nmode = \"command\"\n", MINIMAL);
        let err = Config::parse(&text).unwrap_err();
        assert!(format!("{:#}", err).contains("transmitter.command"));
    }

    #[test]
    fn test_rejects_zero_limit() {
        let text = MINIMAL.replace("group_id = \"group-42\"", "group_id = \"g\"\nlimit = 0");
        assert!(Config::parse(&text).is_err());
    }

    #[test]
    fn test_rejects_tiny_line_length() {
        let text = format!("{}\n[log]\nmax_line_length = 4\n", MINIMAL);
        assert!(Config::parse(&text).is_err());
    }

    #[test]
    fn test_missing_api_section_fails() {
        assert!(Config::parse("[poller]\ninterval_secs = 1\n").is_err());
    }
}
