use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use super::{
    ConfigContentProvider, ConfigError, ConfigSerializer, FileContentConfigProvider, Validate,
    YamlConfigSerializer,
};

pub struct ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer = YamlConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    config_serializer: TConfigSerializer,
    config_content_provider: TConfigContentProvider,
    config: Mutex<Option<TConfig>>,
}

impl<TConfig> ConfigManager<FileContentConfigProvider, TConfig, YamlConfigSerializer>
where
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
{
    pub fn from_yaml_file(file_path: impl Into<PathBuf>) -> Self {
        Self::new(FileContentConfigProvider::new(file_path), YamlConfigSerializer)
    }
}

impl<TConfigContentProvider, TConfig, TConfigSerializer>
    ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    pub fn new(
        config_content_provider: TConfigContentProvider,
        config_serializer: TConfigSerializer,
    ) -> Self {
        Self {
            config: Mutex::new(None),
            config_content_provider,
            config_serializer,
        }
    }

    /// Reads and validates the stored config once, then serves the cached
    /// copy. Nothing stored yields the default.
    pub fn get_config(&self) -> Result<TConfig, ConfigError> {
        let mut current = self.config.lock().unwrap();

        if let Some(config) = current.as_ref() {
            return Ok(config.clone());
        }

        let Some(config_data) = self.config_content_provider.get_config_content()? else {
            return Ok(TConfig::default());
        };

        let config = self.config_serializer.deserialize(&config_data)?;
        config.validate().map_err(ConfigError::Invalid)?;

        *current = Some(config.clone());
        Ok(config)
    }

    pub fn set_config(&self, config: &TConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::Invalid)?;

        let serialized_config = self.config_serializer.serialize(config)?;
        self.config_content_provider
            .set_config_content(&serialized_config)?;

        let mut current = self.config.lock().unwrap();
        *current = Some(config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryContentConfigProvider;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct SampleConfig {
        host: String,
        #[serde(default)]
        retries: u32,
    }

    impl Validate for SampleConfig {
        fn validate(&self) -> Result<(), String> {
            if self.retries > 10 {
                return Err("retries must be at most 10".to_string());
            }
            Ok(())
        }
    }

    fn manager(content: Option<&str>) -> ConfigManager<MemoryContentConfigProvider, SampleConfig> {
        ConfigManager::new(
            MemoryContentConfigProvider::new(content.map(str::to_string)),
            YamlConfigSerializer,
        )
    }

    #[test]
    fn test_missing_content_yields_default() {
        assert_eq!(manager(None).get_config().unwrap(), SampleConfig::default());
    }

    #[test]
    fn test_reads_yaml() {
        let config = manager(Some("host: example.org\nretries: 3\n")).get_config().unwrap();
        assert_eq!(config.host, "example.org");
        assert_eq!(config.retries, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = manager(Some("host: a\nretries: 11\n")).get_config();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let result = manager(Some("host: [unclosed")).get_config();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_set_then_get_round_trips_through_store() {
        let manager = manager(None);
        let config = SampleConfig {
            host: "localhost".to_string(),
            retries: 2,
        };
        manager.set_config(&config).unwrap();
        assert_eq!(manager.get_config().unwrap(), config);

        let invalid = SampleConfig {
            host: "localhost".to_string(),
            retries: 50,
        };
        assert!(matches!(manager.set_config(&invalid), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_yields_default() {
        let path = std::env::temp_dir().join("tictactoe_missing_config_for_test.yaml");
        let _ = std::fs::remove_file(&path);
        let manager: ConfigManager<FileContentConfigProvider, SampleConfig> =
            ConfigManager::from_yaml_file(path);
        assert_eq!(manager.get_config().unwrap(), SampleConfig::default());
    }
}
