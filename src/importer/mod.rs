// ==========================================
// 施工进度跟踪系统 - 导入层
// ==========================================
// 职责: 材料清单表格 → 已校验、已加权的离散构件
// 组件（由底向上）:
//   尺寸解析 → 权重计算 / 表头映射 / 身份键 → 行校验 → 数量展开 → 导入器
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod column_mapper;
pub mod duplicate_keys;
pub mod error;
pub mod file_parser;
pub mod identity_key;
pub mod importer_trait;
pub mod quantity_exploder;
pub mod row_validator;
pub mod size_parser;
pub mod takeoff_importer;
pub mod weight_calculator;

// 重导出核心类型
pub use column_mapper::{map_columns, ColumnMapper};
pub use duplicate_keys::{BatchKeySet, KeyRegistry, SharedBatchKeySet};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use identity_key::{generate_identity_key, normalize_display_size, normalize_drawing};
pub use quantity_exploder::explode_quantity;
pub use row_validator::{validate_rows, RowValidator};
pub use size_parser::parse_size;
pub use takeoff_importer::{merge_linear_runs, TakeoffImporter};
pub use weight_calculator::{
    calculate_weight, distribute_budget, fallback_message, WeightCalculator,
};

// 重导出 Trait 接口
pub use importer_trait::{ComponentRepository, FileParser};
