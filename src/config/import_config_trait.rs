// ==========================================
// 施工进度跟踪系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_config::{ImportConfig, WeightConfig};
use std::collections::BTreeMap;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道读取配置
// 实现者: ConfigManager / ImportConfig（测试直接使用结构体）
pub trait ImportConfigReader: Send + Sync {
    /// 获取权重计算参数
    ///
    /// # 默认值
    /// - exponent 1.5 / linear_feet_coefficient 0.1
    /// - fallback 0.5 / threaded fallback 1.0
    fn weight_config(&self) -> WeightConfig;

    /// 获取额外表头同义词
    fn extra_synonyms(&self) -> BTreeMap<String, Vec<String>>;

    /// 获取分块校验块大小
    ///
    /// # 默认值
    /// - 5000
    fn chunk_size(&self) -> usize;

    /// 获取校验原因文本语言
    ///
    /// # 默认值
    /// - "en"
    fn locale(&self) -> String;

    /// 存在 error 行时是否仍导入有效行
    ///
    /// # 默认值
    /// - false
    fn allow_errors(&self) -> bool;
}

impl ImportConfigReader for ImportConfig {
    fn weight_config(&self) -> WeightConfig {
        self.weight
    }

    fn extra_synonyms(&self) -> BTreeMap<String, Vec<String>> {
        self.extra_synonyms.clone()
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn locale(&self) -> String {
        self.locale.clone()
    }

    fn allow_errors(&self) -> bool {
        self.allow_errors
    }
}
