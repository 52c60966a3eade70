use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, ShizuError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub probe: ProbeConfig,
    pub backups: BackupConfig,
    pub rename_policy: RenamePolicy,
}

impl AppConfig {
    /// Reads a JSON configuration file. Keys absent from the file keep their
    /// default values.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stream.url_prefix.is_empty() {
            return Err(ShizuError::Config("stream.url_prefix is empty".into()));
        }
        if self.probe.ffprobe.is_empty() {
            return Err(ShizuError::Config("probe.ffprobe is empty".into()));
        }
        Ok(())
    }
}

/// Settings used to build the RTMP ingest URL of a live DJ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub url_prefix: String,
    pub domain: String,
    pub servers: Vec<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url_prefix: "rtmp://rtmp-".to_string(),
            domain: "anisonhijack.com/live/".to_string(),
            servers: ["us-east", "us-west", "japan", "europe"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl StreamConfig {
    /// Builds `<prefix><server>.<domain><key>`. Both the server and the key
    /// must be non-empty, otherwise there is no URL.
    pub fn stream_url(&self, rtmp_server: Option<&str>, stream_key: Option<&str>) -> Option<String> {
        match (rtmp_server, stream_key) {
            (Some(server), Some(key)) if !server.is_empty() && !key.is_empty() => Some(format!(
                "{}{}.{}{}",
                self.url_prefix, server, self.domain, key
            )),
            _ => None,
        }
    }

    pub fn is_known_server(&self, server: &str) -> bool {
        self.servers.iter().any(|known| known == server)
    }
}

/// Settings for the ffprobe-backed media probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub ffprobe: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Where timestamped copies of saved documents are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    pub ledger_dir: String,
    pub lineup_dir: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ledger_dir: "ledgers_backup".to_string(),
            lineup_dir: "lineup_backup".to_string(),
        }
    }
}

/// What a rename does when the new name is held by a different record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Fail with `AlreadyExists` and leave the registry untouched.
    #[default]
    Reject,
    /// Replace the other record, which is lost.
    Overwrite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_stream_url_from_server_and_key() {
        let stream = StreamConfig::default();
        assert_eq!(
            stream.stream_url(Some("us-east"), Some("k1")).as_deref(),
            Some("rtmp://rtmp-us-east.anisonhijack.com/live/k1")
        );
        assert_eq!(stream.stream_url(Some("us-east"), Some("")), None);
        assert_eq!(stream.stream_url(None, Some("k1")), None);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "rename_policy": "overwrite", "probe": { "ffprobe": "/opt/ffprobe" } }"#)
                .unwrap();
        assert_eq!(config.rename_policy, RenamePolicy::Overwrite);
        assert_eq!(config.probe.ffprobe, "/opt/ffprobe");
        assert_eq!(config.stream, StreamConfig::default());
        assert!(config.backups.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_probe_binary() {
        let mut config = AppConfig::default();
        config.probe.ffprobe.clear();
        assert!(matches!(config.validate(), Err(ShizuError::Config(_))));
    }

    #[test]
    fn knows_configured_servers() {
        let stream = StreamConfig::default();
        assert!(stream.is_known_server("japan"));
        assert!(!stream.is_known_server("mars"));
    }
}
