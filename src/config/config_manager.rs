// ==========================================
// 施工进度跟踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、校验、快照
// 存储: JSON 文件
// 查找顺序: 显式路径 > 环境变量 TAKEOFF_IMPORT_CONFIG > 用户配置目录 > 默认值
// ==========================================

use crate::config::import_config::{ImportConfig, WeightConfig};
use crate::config::import_config_trait::ImportConfigReader;
use crate::domain::types::ExpectedField;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV_VAR: &str = "TAKEOFF_IMPORT_CONFIG";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ImportConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 按查找顺序加载配置（文件均不存在时使用默认值）
    pub fn new() -> ImportResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = path.trim();
            if !path.is_empty() {
                return Self::from_file(path);
            }
        }

        match Self::default_config_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => {
                debug!("未找到配置文件，使用默认配置");
                Self::from_config(ImportConfig::default())
            }
        }
    }

    /// 从 JSON 文件加载配置
    ///
    /// # 返回
    /// - Err(ConfigReadError): 文件不可读或 JSON 格式错误
    /// - Err(ConfigValueError): 配置值不合法
    pub fn from_file<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ImportError::ConfigReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: ImportConfig =
            serde_json::from_str(&raw).map_err(|e| ImportError::ConfigReadError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::validate(&config)?;
        info!(path = %path.display(), "配置文件加载完成");

        Ok(Self {
            config,
            source: Some(path.to_path_buf()),
        })
    }

    /// 从已有配置创建（会做同样的合法性校验）
    pub fn from_config(config: ImportConfig) -> ImportResult<Self> {
        Self::validate(&config)?;
        Ok(Self {
            config,
            source: None,
        })
    }

    /// 用户配置目录下的默认配置文件
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("takeoff-import").join("config.json"))
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 配置来源文件（默认配置时为 None）
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 获取配置快照（JSON格式）,随导入报告一起留档
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        Ok(serde_json::to_string(&self.config)?)
    }

    fn validate(config: &ImportConfig) -> ImportResult<()> {
        config.weight.validate()?;

        if config.chunk_size == 0 {
            return Err(ImportError::ConfigValueError {
                key: "chunk_size".to_string(),
                value: "0".to_string(),
                message: "块大小必须大于 0".to_string(),
            });
        }

        for field in config.extra_synonyms.keys() {
            if ExpectedField::from_literal(field).is_none() {
                return Err(ImportError::ConfigValueError {
                    key: "extra_synonyms".to_string(),
                    value: field.clone(),
                    message: "不是标准字段".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ImportConfigReader for ConfigManager {
    fn weight_config(&self) -> WeightConfig {
        self.config.weight
    }

    fn extra_synonyms(&self) -> BTreeMap<String, Vec<String>> {
        self.config.extra_synonyms.clone()
    }

    fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    fn locale(&self) -> String {
        self.config.locale.clone()
    }

    fn allow_errors(&self) -> bool {
        self.config.allow_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_file_partial_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"{{ "locale": "zh-CN", "extra_synonyms": {{ "DRAWING": ["ISO NO"] }} }}"#
        )
        .unwrap();

        let manager = ConfigManager::from_file(temp_file.path()).unwrap();
        assert_eq!(manager.locale(), "zh-CN");
        assert_eq!(manager.chunk_size(), 5000);
        assert_eq!(
            manager.extra_synonyms().get("DRAWING"),
            Some(&vec!["ISO NO".to_string()])
        );
        assert_eq!(manager.source(), Some(temp_file.path()));
    }

    #[test]
    fn test_from_file_malformed_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{ not json").unwrap();

        let result = ConfigManager::from_file(temp_file.path());
        assert!(matches!(result, Err(ImportError::ConfigReadError { .. })));
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let mut config = ImportConfig::default();
        config.weight.fallback_weight = 0.0;

        let result = ConfigManager::from_config(config);
        assert!(matches!(result, Err(ImportError::ConfigValueError { .. })));
    }

    #[test]
    fn test_rejects_unknown_synonym_field() {
        let mut config = ImportConfig::default();
        config
            .extra_synonyms
            .insert("COLOR".to_string(), vec!["COLOUR".to_string()]);

        let result = ConfigManager::from_config(config);
        assert!(matches!(result, Err(ImportError::ConfigValueError { .. })));
    }

    #[test]
    fn test_config_snapshot_round_trips() {
        let manager = ConfigManager::from_config(ImportConfig::default()).unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();
        let parsed: ImportConfig = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(&parsed, manager.config());
    }
}
