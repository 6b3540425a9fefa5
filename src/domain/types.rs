// ==========================================
// 施工进度跟踪系统 - 领域类型定义
// ==========================================
// 职责: 标准字段 / 构件类型 / 匹配层级 / 校验状态与类别
// 红线: 类别 token 为稳定对外契约,不得随语言切换变化
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 标准字段 (Expected Field)
// ==========================================
// 封闭集合: 必填 4 个 + 可选 7 个
// 序列化格式: 表头字面量 (与材料清单一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpectedField {
    #[serde(rename = "DRAWING")]
    Drawing,
    #[serde(rename = "TYPE")]
    Type,
    #[serde(rename = "QTY")]
    Qty,
    #[serde(rename = "CMDTY CODE")]
    CmdtyCode,
    #[serde(rename = "SIZE")]
    Size,
    #[serde(rename = "SPEC")]
    Spec,
    #[serde(rename = "DESCRIPTION")]
    Description,
    #[serde(rename = "COMMENTS")]
    Comments,
    #[serde(rename = "AREA")]
    Area,
    #[serde(rename = "SYSTEM")]
    System,
    #[serde(rename = "TEST_PACKAGE")]
    TestPackage,
}

impl ExpectedField {
    /// 全部标准字段（匹配时的字段优先顺序）
    pub const ALL: [ExpectedField; 11] = [
        ExpectedField::Drawing,
        ExpectedField::Type,
        ExpectedField::Qty,
        ExpectedField::CmdtyCode,
        ExpectedField::Size,
        ExpectedField::Spec,
        ExpectedField::Description,
        ExpectedField::Comments,
        ExpectedField::Area,
        ExpectedField::System,
        ExpectedField::TestPackage,
    ];

    /// 必填字段
    pub const REQUIRED: [ExpectedField; 4] = [
        ExpectedField::Drawing,
        ExpectedField::Type,
        ExpectedField::Qty,
        ExpectedField::CmdtyCode,
    ];

    /// 表头字面量
    pub fn literal(&self) -> &'static str {
        match self {
            ExpectedField::Drawing => "DRAWING",
            ExpectedField::Type => "TYPE",
            ExpectedField::Qty => "QTY",
            ExpectedField::CmdtyCode => "CMDTY CODE",
            ExpectedField::Size => "SIZE",
            ExpectedField::Spec => "SPEC",
            ExpectedField::Description => "DESCRIPTION",
            ExpectedField::Comments => "COMMENTS",
            ExpectedField::Area => "AREA",
            ExpectedField::System => "SYSTEM",
            ExpectedField::TestPackage => "TEST_PACKAGE",
        }
    }

    /// 由字面量反查（大小写不敏感）
    pub fn from_literal(value: &str) -> Option<Self> {
        let upper = value.trim().to_uppercase();
        Self::ALL.iter().copied().find(|f| f.literal() == upper)
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for ExpectedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal())
    }
}

// ==========================================
// 匹配层级 (Match Tier)
// ==========================================
// 红线: 层级与置信度一一对应 exact=100 / case-insensitive=95 / synonym=85
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    Exact,           // 完全一致（区分大小写）
    CaseInsensitive, // 忽略大小写
    Synonym,         // 同义词
}

impl MatchTier {
    /// 按尝试顺序排列
    pub const ORDERED: [MatchTier; 3] = [
        MatchTier::Exact,
        MatchTier::CaseInsensitive,
        MatchTier::Synonym,
    ];

    pub fn confidence(&self) -> u8 {
        match self {
            MatchTier::Exact => 100,
            MatchTier::CaseInsensitive => 95,
            MatchTier::Synonym => 85,
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTier::Exact => write!(f, "exact"),
            MatchTier::CaseInsensitive => write!(f, "case-insensitive"),
            MatchTier::Synonym => write!(f, "synonym"),
        }
    }
}

// ==========================================
// 构件类型 (Component Type)
// ==========================================
// 白名单: 大小写不敏感,空格与下划线等价
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    #[serde(rename = "Spool")]
    Spool,
    #[serde(rename = "Field_Weld")]
    FieldWeld,
    #[serde(rename = "Valve")]
    Valve,
    #[serde(rename = "Instrument")]
    Instrument,
    #[serde(rename = "Support")]
    Support,
    #[serde(rename = "Pipe")]
    Pipe,
    #[serde(rename = "Fitting")]
    Fitting,
    #[serde(rename = "Flange")]
    Flange,
    #[serde(rename = "Tubing")]
    Tubing,
    #[serde(rename = "Hose")]
    Hose,
    #[serde(rename = "Misc_Component")]
    MiscComponent,
    #[serde(rename = "Threaded_Pipe")]
    ThreadedPipe,
}

impl ComponentType {
    pub const ALL: [ComponentType; 12] = [
        ComponentType::Spool,
        ComponentType::FieldWeld,
        ComponentType::Valve,
        ComponentType::Instrument,
        ComponentType::Support,
        ComponentType::Pipe,
        ComponentType::Fitting,
        ComponentType::Flange,
        ComponentType::Tubing,
        ComponentType::Hose,
        ComponentType::MiscComponent,
        ComponentType::ThreadedPipe,
    ];

    /// 规范名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Spool => "Spool",
            ComponentType::FieldWeld => "Field_Weld",
            ComponentType::Valve => "Valve",
            ComponentType::Instrument => "Instrument",
            ComponentType::Support => "Support",
            ComponentType::Pipe => "Pipe",
            ComponentType::Fitting => "Fitting",
            ComponentType::Flange => "Flange",
            ComponentType::Tubing => "Tubing",
            ComponentType::Hose => "Hose",
            ComponentType::MiscComponent => "Misc_Component",
            ComponentType::ThreadedPipe => "Threaded_Pipe",
        }
    }

    /// 解析表格中的类型文本
    ///
    /// # 规则
    /// - TRIM 后空白段统一替换为下划线（"Field Weld" → "Field_Weld"）
    /// - 与白名单做大小写不敏感比较
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_type_name(raw);
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(&normalized))
    }

    /// 入库存储值（小写）
    pub fn storage_name(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 类型名称标准化: TRIM + 空白 → 下划线
pub fn normalize_type_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}

/// 是否为按长度计量的类型（管道 / 含 threaded 的类型）
///
/// 权重计算使用此宽口径;行校验的小数数量例外只认 Threaded_Pipe。
pub fn is_linear_run_type(type_name: &str) -> bool {
    let lower = type_name.trim().to_lowercase();
    lower == "pipe" || lower.contains("threaded")
}

// ==========================================
// 校验状态 (Validation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,   // 可导入
    Skipped, // 警告,排除但不阻断
    Error,   // 阻断批次
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::Skipped => write!(f, "skipped"),
            ValidationStatus::Error => write!(f, "error"),
        }
    }
}

// ==========================================
// 校验类别 (Validation Category)
// ==========================================
// 序列化格式: snake_case（稳定 token,供前端本地化）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    EmptyDrawing,
    MissingRequiredField,
    InvalidQuantity,
    ZeroQuantity,
    UnsupportedType,
    DuplicateIdentityKey,
}

impl ValidationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCategory::EmptyDrawing => "empty_drawing",
            ValidationCategory::MissingRequiredField => "missing_required_field",
            ValidationCategory::InvalidQuantity => "invalid_quantity",
            ValidationCategory::ZeroQuantity => "zero_quantity",
            ValidationCategory::UnsupportedType => "unsupported_type",
            ValidationCategory::DuplicateIdentityKey => "duplicate_identity_key",
        }
    }
}

impl fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 权重口径 (Weight Basis)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightBasis {
    Fixed,      // 固定兜底值
    Dimension,  // 按管径
    LinearFeet, // 按管径 × 长度
}

impl fmt::Display for WeightBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightBasis::Fixed => write!(f, "fixed"),
            WeightBasis::Dimension => write!(f, "dimension"),
            WeightBasis::LinearFeet => write!(f, "linear_feet"),
        }
    }
}
