mod client_config;

pub(crate) use tictactoe_common::config::{ConfigManager, FileContentConfigProvider, YamlConfigSerializer};

pub use client_config::{ClientConfig, ModeConfig, get_config_manager};
