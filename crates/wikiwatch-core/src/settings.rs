use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::components::{ComponentName, ComponentSet};
use crate::error::{Result, WikiwatchError};

/// Article path used to build links for log entries, which carry no URL.
pub const DEFAULT_ARTICLE_PATH: &str = "http://en.wikipedia.org/wiki/";

/// Seconds the watcher waits before reconnecting after a failure.
pub const DEFAULT_WATCHER_BACKOFF_SECS: u64 = 5;

/// Standard IRC port.
pub const DEFAULT_IRC_PORT: u16 = 6667;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Relay a wiki's recent-changes feed into an IRC channel
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wikiwatch",
    about = "Relay a wiki's recent-changes feed into an IRC channel",
    version
)]
pub struct Settings {
    /// Path to the JSON config file (defaults to ~/.wikiwatch/config.json)
    #[arg(long, env = "WIKIWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Components to run, comma separated (overrides the config file)
    #[arg(long, value_delimiter = ',', env = "WIKIWATCH_COMPONENTS")]
    pub components: Vec<ComponentName>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Write the effective config (file plus --components) to the config file and exit
    #[arg(long)]
    pub save_config: bool,
}

impl Settings {
    /// Parse the process arguments and apply `--debug`.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os().collect())
    }

    /// Same as [`load`](Self::load) but accepts an explicit argument list.
    pub fn load_from_args(args: Vec<std::ffi::OsString>) -> Self {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The config file this run reads, and `--save-config` writes.
    pub fn config_file(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(BotConfig::config_path)
    }

    /// Load the bot config this run should use.
    ///
    /// An explicit `--config` path must exist unless `--save-config` is about
    /// to create it; the default path may be absent. A missing file yields
    /// defaults. `--components` replaces the file's list.
    pub fn bot_config(&self) -> Result<BotConfig> {
        let path = self.config_file();
        let must_exist = self.config.is_some() && !self.save_config;
        let mut config = if must_exist || path.exists() {
            BotConfig::load_from(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            BotConfig::default()
        };

        if !self.components.is_empty() {
            config.components = self.components.clone();
        }

        Ok(config)
    }
}

// ── BotConfig (file) ───────────────────────────────────────────────────────────

/// Connection details for one IRC server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub nick: String,
    #[serde(default = "default_ident")]
    pub ident: String,
    #[serde(default = "default_realname")]
    pub realname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// The interactive front-end's server, the channels it sits in, and where
/// feed notifications are posted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrontendConfig {
    #[serde(flatten)]
    pub server: ServerConfig,
    #[serde(default)]
    pub channels: Vec<String>,
    /// Targets for watcher notifications; falls back to `channels` when empty.
    #[serde(default)]
    pub notify_channels: Vec<String>,
}

impl FrontendConfig {
    /// Where watcher notifications should be delivered.
    pub fn notify_targets(&self) -> &[String] {
        if self.notify_channels.is_empty() {
            &self.channels
        } else {
            &self.notify_channels
        }
    }
}

/// The recent-changes server and the channel carrying the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatcherConfig {
    #[serde(flatten)]
    pub server: ServerConfig,
    pub feed_channel: String,
}

/// Contents of `~/.wikiwatch/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotConfig {
    #[serde(default)]
    pub components: Vec<ComponentName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<FrontendConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watcher: Option<WatcherConfig>,
    #[serde(default = "default_article_path")]
    pub article_path: String,
    #[serde(default = "default_backoff_secs")]
    pub watcher_backoff_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            frontend: None,
            watcher: None,
            article_path: default_article_path(),
            watcher_backoff_secs: DEFAULT_WATCHER_BACKOFF_SECS,
        }
    }
}

impl BotConfig {
    /// Return the default path to the config file.
    /// Uses `~/.wikiwatch/config.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".wikiwatch").join("config.json")
    }

    /// Load a config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| WikiwatchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| WikiwatchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config as pretty JSON, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// The enabled components, deduplicated.
    pub fn component_set(&self) -> ComponentSet {
        self.components.iter().copied().collect()
    }

    /// Check that every enabled component has the section it needs.
    ///
    /// An empty component list is not an error here; the orchestrator owns
    /// that decision.
    pub fn validate(&self) -> Result<()> {
        let enabled = self.component_set();
        if enabled.contains(ComponentName::Frontend) && self.frontend.is_none() {
            return Err(WikiwatchError::MissingSection {
                component: "frontend",
                section: "frontend",
            });
        }
        if enabled.contains(ComponentName::Watcher) {
            let Some(watcher) = &self.watcher else {
                return Err(WikiwatchError::MissingSection {
                    component: "watcher",
                    section: "watcher",
                });
            };
            if watcher.feed_channel.is_empty() {
                return Err(WikiwatchError::Config(
                    "watcher.feed_channel must not be empty".to_string(),
                ));
            }
        }
        if self.watcher_backoff_secs == 0 {
            return Err(WikiwatchError::Config(
                "watcher_backoff_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    DEFAULT_IRC_PORT
}

fn default_ident() -> String {
    "wikiwatch".to_string()
}

fn default_realname() -> String {
    "wikiwatch recent-changes relay".to_string()
}

fn default_article_path() -> String {
    DEFAULT_ARTICLE_PATH.to_string()
}

fn default_backoff_secs() -> u64 {
    DEFAULT_WATCHER_BACKOFF_SECS
}

// ── Tests ──────────────────────────────────────────────────────────────────────
