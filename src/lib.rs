// ==========================================
// 施工进度跟踪系统 - 材料清单导入核心库
// ==========================================
// 职责: 材料清单表格 → 表头映射 → 行校验 → 构件展开 → 安装工作量权重
// 边界: 持久化、界面、报表导出由外部协作方负责
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 解析 / 校验 / 展开 / 权重
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ComponentType, ExpectedField, MatchTier, ValidationCategory, ValidationStatus, WeightBasis,
};

// 领域实体
pub use domain::{
    Component, ComponentIdentity, ImportReport, MappingResult, NormalizedRow, ParsedSize,
    RawSheet, ValidationOutcome, ValidationSummary, WeightResult, WeightedComponent,
};

// 导入管道
pub use importer::{
    calculate_weight, distribute_budget, explode_quantity, generate_identity_key, map_columns,
    parse_size, validate_rows, BatchKeySet, ColumnMapper, ComponentRepository, ImportError,
    ImportResult, KeyRegistry, RowValidator, SharedBatchKeySet, TakeoffImporter,
    WeightCalculator,
};

// 配置
pub use config::{ConfigManager, ImportConfig, ImportConfigReader};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "takeoff-import";
