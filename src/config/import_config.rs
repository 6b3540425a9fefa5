use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 导入配置（持久化对象）
///
/// 存储位置：JSON 文件（见 ConfigManager 的查找顺序）,缺省字段取默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 权重计算参数
    pub weight: WeightConfig,

    /// 额外表头同义词（标准字段字面量 → 同义词列表）,追加在内置同义词之后
    pub extra_synonyms: BTreeMap<String, Vec<String>>,

    /// 分块校验的块大小（行）
    pub chunk_size: usize,

    /// 校验原因文本的语言（"en" / "zh-CN"）
    pub locale: String,

    /// 存在 error 行时仍导入有效行（调用方显式放行）
    pub allow_errors: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            weight: WeightConfig::default(),
            extra_synonyms: BTreeMap::new(),
            chunk_size: 5000,
            locale: "en".to_string(),
            allow_errors: false,
        }
    }
}

/// 权重计算参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// 管径幂指数（工作量随管径超线性增长）
    pub exponent: f64,

    /// 线性长度系数（每英尺工作量折算为离散构件可比单位）
    pub linear_feet_coefficient: f64,

    /// 尺寸缺失/无法解析时的兜底权重
    pub fallback_weight: f64,

    /// 螺纹管类的兜底权重
    pub threaded_fallback_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            exponent: 1.5,
            linear_feet_coefficient: 0.1,
            fallback_weight: 0.5,
            threaded_fallback_weight: 1.0,
        }
    }
}

impl WeightConfig {
    /// 校验参数（全部须为有限正数,保证权重恒为正）
    ///
    /// # 返回
    /// - Err(ConfigValueError): 首个不合法的参数
    pub fn validate(&self) -> ImportResult<()> {
        let positive_fields = [
            ("weight.exponent", self.exponent),
            ("weight.linear_feet_coefficient", self.linear_feet_coefficient),
            ("weight.fallback_weight", self.fallback_weight),
            ("weight.threaded_fallback_weight", self.threaded_fallback_weight),
        ];
        for (key, value) in positive_fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ImportError::ConfigValueError {
                    key: key.to_string(),
                    value: value.to_string(),
                    message: "必须为正数".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ImportConfig =
            serde_json::from_str(r#"{ "chunk_size": 100, "weight": { "exponent": 2.0 } }"#)
                .unwrap();
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.weight.exponent, 2.0);
        assert_eq!(config.weight.linear_feet_coefficient, 0.1);
        assert_eq!(config.locale, "en");
        assert!(!config.allow_errors);
    }

    #[test]
    fn test_weight_config_rejects_non_positive() {
        assert!(WeightConfig::default().validate().is_ok());

        let zero_fallback = WeightConfig {
            fallback_weight: 0.0,
            ..WeightConfig::default()
        };
        assert!(matches!(
            zero_fallback.validate(),
            Err(ImportError::ConfigValueError { ref key, .. }) if key == "weight.fallback_weight"
        ));

        let nan_exponent = WeightConfig {
            exponent: f64::NAN,
            ..WeightConfig::default()
        };
        assert!(nan_exponent.validate().is_err());
    }
}
