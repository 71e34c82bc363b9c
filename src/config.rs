use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub commands: CommandConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub status: StatusConfig,
    pub yunhu: Option<YunhuConfig>,
    pub telegram: Option<TelegramConfig>,
    pub onebot: Option<OneBotConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the adapter webhook server binds to
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandConfig {
    /// Chat messages that request a status report
    #[serde(default = "default_phrases")]
    pub phrases: Vec<String>,
    /// Command names accepted from platform command events
    #[serde(default = "default_command_names")]
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplyConfig {
    /// Send a short plain-text apology when the status reply fails to send
    #[serde(default = "default_true")]
    pub apology_on_failure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    /// Framework name and version shown in the environment block
    #[serde(default = "default_framework")]
    pub framework: String,
    /// Mount point of the disk to report; the first disk when unset
    #[serde(default)]
    pub disk_mount: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct YunhuConfig {
    pub token: String,
    #[serde(default = "default_yunhu_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OneBotConfig {
    /// Base URL of the OneBot v11 HTTP API
    pub api_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_phrases() -> Vec<String> {
    vec![
        "服务器状态".to_string(),
        "/服务器状态".to_string(),
        "/status".to_string(),
    ]
}

fn default_command_names() -> Vec<String> {
    vec!["服务器状态".to_string(), "status".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_framework() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_yunhu_base_url() -> String {
    "https://chat-go.jwzhd.com/open-apis/v1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            phrases: default_phrases(),
            names: default_command_names(),
        }
    }
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            apology_on_failure: default_true(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            framework: default_framework(),
            disk_mount: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid TOML")?;

        if config.yunhu.is_none() && config.telegram.is_none() && config.onebot.is_none() {
            anyhow::bail!(
                "No platform configured: add at least one of [yunhu], [telegram], [onebot]"
            );
        }

        Ok(config)
    }

    /// Names of the platforms that have a config section, for startup logging
    pub fn enabled_platforms(&self) -> Vec<&'static str> {
        let mut enabled = Vec::new();
        if self.yunhu.is_some() {
            enabled.push("yunhu");
        }
        if self.telegram.is_some() {
            enabled.push("telegram");
        }
        if self.onebot.is_some() {
            enabled.push("onebot");
        }
        enabled
    }
}
