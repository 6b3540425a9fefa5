// ==========================================
// 施工进度跟踪系统 - 领域模型层
// ==========================================
// 职责: 定义材料清单导入的实体与类型
// 红线: 不含数据访问逻辑,不含导入管道逻辑
// ==========================================

pub mod identity;
pub mod takeoff;
pub mod types;

// 重导出核心类型
pub use identity::ComponentIdentity;
pub use takeoff::{
    AuxAttributes, ColumnLookup, ColumnMapping, Component, ComponentAttributes, ImportReport,
    MappingResult, NormalizedRow, ParsedSize, RawRow, RawSheet, ReducerDiameters,
    ValidationOutcome, ValidationSummary, WeightFallbackReason, WeightMetadata, WeightResult,
    WeightedComponent,
};
pub use types::{
    ComponentType, ExpectedField, MatchTier, ValidationCategory, ValidationStatus, WeightBasis,
};
