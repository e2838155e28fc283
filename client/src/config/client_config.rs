use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tictactoe_common::config::Validate;
use tictactoe_common::games::tictactoe::{Difficulty, Mark, OnlineSettings};

use super::{ConfigManager, FileContentConfigProvider, YamlConfigSerializer};

pub const CONFIG_FILE_NAME: &str = "tictactoe_client_config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModeConfig {
    #[default]
    PlayerVsComputer,
    PlayerVsPlayer,
    Online,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: Some(5000),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("server host must not be empty".to_string());
        }
        if self.port == Some(0) {
            return Err("server port must not be 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub mode: ModeConfig,
    pub difficulty: Difficulty,
    pub human_mark: Mark,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: ModeConfig::default(),
            difficulty: Difficulty::default(),
            human_mark: Mark::X,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineConfig {
    pub handshake_timeout_ms: u64,
    pub tick_interval_ms: u64,
}

impl Default for OnlineConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 10_000,
            tick_interval_ms: 33,
        }
    }
}

impl OnlineConfig {
    pub fn settings(&self) -> OnlineSettings {
        OnlineSettings {
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            tick_interval: Duration::from_millis(self.tick_interval_ms),
        }
    }
}

impl Validate for OnlineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.handshake_timeout_ms == 0 {
            return Err("handshake_timeout_ms must be greater than 0".to_string());
        }
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub game: GameConfig,
    pub online: OnlineConfig,
    pub seed: Option<u64>,
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.online.validate()?;
        Ok(())
    }
}

/// The config file lives next to the executable.
pub fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

pub fn get_config_manager(
    path: Option<PathBuf>,
) -> ConfigManager<FileContentConfigProvider, ClientConfig, YamlConfigSerializer> {
    ConfigManager::from_yaml_file(path.unwrap_or_else(default_config_path))
}
