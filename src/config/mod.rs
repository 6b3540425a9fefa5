// ==========================================
// 施工进度跟踪系统 - 配置层
// ==========================================
// 职责: 导入配置加载与读取
// 存储: JSON 文件 + 默认值
// ==========================================

pub mod config_manager;
pub mod import_config;
pub mod import_config_trait;

// 重导出核心配置类型
pub use config_manager::{ConfigManager, CONFIG_ENV_VAR};
pub use import_config::{ImportConfig, WeightConfig};
pub use import_config_trait::ImportConfigReader;
