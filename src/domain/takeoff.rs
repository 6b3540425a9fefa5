// ==========================================
// 施工进度跟踪系统 - 材料清单领域模型
// ==========================================
// 职责: 表头映射 / 尺寸解析 / 权重 / 行校验 / 构件 的数据结构
// 生命周期: 仅在一次导入流程内,交给外部数据仓储后不再持有
// ==========================================

use crate::domain::identity::ComponentIdentity;
use crate::domain::types::{
    ExpectedField, MatchTier, ValidationCategory, ValidationStatus, WeightBasis,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 原始行记录（列名 → 单元格文本）
pub type RawRow = HashMap<String, String>;

/// 附加属性（权重计算读取 size / total_linear_feet）
pub type AuxAttributes = serde_json::Map<String, serde_json::Value>;

// ==========================================
// RawSheet - 表格读取结果
// ==========================================
// 表头保持原始顺序（表头映射依赖顺序）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// ColumnMapping - 单列映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub csv_column: String,            // 原始表头（含标记符）
    pub expected_field: ExpectedField, // 标准字段
    pub confidence: u8,                // 置信度（由层级决定）
    pub tier: MatchTier,               // 匹配层级
}

impl ColumnMapping {
    pub fn new(csv_column: &str, expected_field: ExpectedField, tier: MatchTier) -> Self {
        Self {
            csv_column: csv_column.to_string(),
            expected_field,
            confidence: tier.confidence(),
            tier,
        }
    }
}

// ==========================================
// MappingResult - 表头映射结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingResult {
    pub mappings: Vec<ColumnMapping>,
    pub unmapped_headers: Vec<String>,
    pub missing_required_fields: Vec<ExpectedField>,
    pub has_all_required_fields: bool,
}

impl MappingResult {
    pub fn mapping_for(&self, field: ExpectedField) -> Option<&ColumnMapping> {
        self.mappings.iter().find(|m| m.expected_field == field)
    }

    /// 生成行校验用的字段查找表
    pub fn lookup(&self) -> ColumnLookup {
        ColumnLookup(
            self.mappings
                .iter()
                .map(|m| (m.expected_field, m.csv_column.clone()))
                .collect(),
        )
    }
}

// ==========================================
// ColumnLookup - 标准字段 → 源表头
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLookup(BTreeMap<ExpectedField, String>);

impl ColumnLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: ExpectedField, header: &str) {
        self.0.insert(field, header.to_string());
    }

    pub fn header(&self, field: ExpectedField) -> Option<&str> {
        self.0.get(&field).map(|h| h.as_str())
    }

    /// 源表头是否被某个标准字段占用
    pub fn is_mapped_header(&self, header: &str) -> bool {
        self.0.values().any(|h| h == header)
    }

    /// 读取字段值（TRIM,缺列视为空串）
    pub fn value<'a>(&self, row: &'a RawRow, field: ExpectedField) -> &'a str {
        self.header(field)
            .and_then(|h| row.get(h))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}

impl FromIterator<(ExpectedField, String)> for ColumnLookup {
    fn from_iter<I: IntoIterator<Item = (ExpectedField, String)>>(iter: I) -> Self {
        ColumnLookup(iter.into_iter().collect())
    }
}

// ==========================================
// ParsedSize - 尺寸解析结果
// ==========================================
// diameter = None 表示无法解析; Some(0.0) 为合法值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSize {
    pub diameter: Option<f64>,
    pub is_reducer: bool,
    pub second_diameter: Option<f64>,
    pub raw_text: String,
}

impl ParsedSize {
    pub fn invalid(raw_text: &str) -> Self {
        Self {
            diameter: None,
            is_reducer: false,
            second_diameter: None,
            raw_text: raw_text.to_string(),
        }
    }

    pub fn plain(raw_text: &str, diameter: f64) -> Self {
        Self {
            diameter: Some(diameter),
            is_reducer: false,
            second_diameter: None,
            raw_text: raw_text.to_string(),
        }
    }

    pub fn reducer(raw_text: &str, first: f64, second: f64) -> Self {
        Self {
            diameter: Some((first + second) / 2.0),
            is_reducer: true,
            second_diameter: Some(second),
            raw_text: raw_text.to_string(),
        }
    }
}

// ==========================================
// WeightResult - 安装工作量权重
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightResult {
    pub weight: f64, // 恒 > 0
    pub basis: WeightBasis,
    pub metadata: WeightMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightMetadata {
    pub size_text: Option<String>,
    pub diameter: Option<f64>,
    pub reducer: Option<ReducerDiameters>,
    pub linear_feet: Option<f64>,
    pub fallback_reason: Option<WeightFallbackReason>,
    pub invalid_length: bool,
}

/// 异径件两端管径及其平均值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReducerDiameters {
    pub first: f64,
    pub second: f64,
    pub average: f64,
}

/// 兜底权重原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightFallbackReason {
    MissingSize,
    NonScalarSize,
    EmptySize,
    UnparseableSize,
    NonPositiveDiameter,
}

impl WeightFallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightFallbackReason::MissingSize => "missing_size",
            WeightFallbackReason::NonScalarSize => "non_scalar_size",
            WeightFallbackReason::EmptySize => "empty_size",
            WeightFallbackReason::UnparseableSize => "unparseable_size",
            WeightFallbackReason::NonPositiveDiameter => "non_positive_diameter",
        }
    }
}

// ==========================================
// NormalizedRow - 校验通过的标准化行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub drawing: String, // 大写 + TRIM + 空白折叠
    pub component_type: crate::domain::types::ComponentType,
    pub raw_type: String,
    pub qty: f64,
    pub commodity_code: String,
    pub size: String,             // 展示口径（"/"→"X",去引号,空 → NOSIZE）
    pub raw_size: Option<String>, // 原始尺寸文本（权重计算使用）
    pub spec: Option<String>,
    pub description: Option<String>,
    pub comments: Option<String>,
    pub area: Option<String>,
    pub system: Option<String>,
    pub test_package: Option<String>,
    pub identity_key: String,
    pub unmapped_fields: BTreeMap<String, String>,
}

// ==========================================
// ValidationOutcome - 单行校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub row_number: usize, // 从 1 开始
    pub status: ValidationStatus,
    pub category: Option<ValidationCategory>,
    pub reason: Option<String>,
    pub normalized: Option<NormalizedRow>,
}

impl ValidationOutcome {
    pub fn valid(row_number: usize, normalized: NormalizedRow) -> Self {
        Self {
            row_number,
            status: ValidationStatus::Valid,
            category: None,
            reason: None,
            normalized: Some(normalized),
        }
    }

    pub fn skipped(row_number: usize, category: ValidationCategory, reason: String) -> Self {
        Self {
            row_number,
            status: ValidationStatus::Skipped,
            category: Some(category),
            reason: Some(reason),
            normalized: None,
        }
    }

    pub fn error(row_number: usize, category: ValidationCategory, reason: String) -> Self {
        Self {
            row_number,
            status: ValidationStatus::Error,
            category: Some(category),
            reason: Some(reason),
            normalized: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }
}

// ==========================================
// ValidationSummary - 批次校验汇总
// ==========================================
// 红线: skipped 不阻断导入, can_import = error_count == 0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub valid_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub by_category: BTreeMap<ValidationCategory, usize>,
    pub can_import: bool,
}

impl ValidationSummary {
    pub fn from_outcomes(outcomes: &[ValidationOutcome]) -> Self {
        let mut summary = ValidationSummary {
            total_rows: outcomes.len(),
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome.status {
                ValidationStatus::Valid => summary.valid_count += 1,
                ValidationStatus::Skipped => summary.skipped_count += 1,
                ValidationStatus::Error => summary.error_count += 1,
            }
            if let Some(category) = outcome.category {
                *summary.by_category.entry(category).or_insert(0) += 1;
            }
        }

        summary.can_import = summary.error_count == 0;
        summary
    }
}

// ==========================================
// Component - 离散构件（交给外部数据仓储）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub identity_key: String,
    pub identity: ComponentIdentity,
    pub component_type: String, // 小写存储
    pub drawing_id: String,
    pub attributes: ComponentAttributes,
    pub unmapped_fields: BTreeMap<String, String>,
}

/// 同一行展开出的构件共享的属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentAttributes {
    pub drawing: String,
    pub size: String,
    pub raw_size: Option<String>,
    pub commodity_code: String,
    pub spec: Option<String>,
    pub description: Option<String>,
    pub comments: Option<String>,
    pub area: Option<String>,
    pub system: Option<String>,
    pub test_package: Option<String>,
    pub original_qty: f64,
}

impl ComponentAttributes {
    /// 转为权重计算的附加属性（尺寸取原始文本）
    pub fn to_aux_attributes(&self, total_linear_feet: Option<f64>) -> AuxAttributes {
        let mut aux = AuxAttributes::new();
        let size = self.raw_size.clone().unwrap_or_default();
        aux.insert("size".to_string(), serde_json::Value::String(size));
        if let Some(feet) = total_linear_feet {
            aux.insert("total_linear_feet".to_string(), serde_json::json!(feet));
        }
        aux
    }
}

/// 构件 + 权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedComponent {
    pub component: Component,
    pub weight: WeightResult,
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub mapping: MappingResult,
    pub outcomes: Vec<ValidationOutcome>,
    pub summary: ValidationSummary,
    pub imported: bool, // 是否已交付数据仓储
    pub components_created: usize,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_and_can_import() {
        let outcomes = vec![
            ValidationOutcome::skipped(1, ValidationCategory::ZeroQuantity, "zero".to_string()),
            ValidationOutcome::skipped(2, ValidationCategory::UnsupportedType, "type".to_string()),
        ];
        let summary = ValidationSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.skipped_count, 2);
        assert!(summary.can_import);

        let outcomes = vec![ValidationOutcome::error(
            1,
            ValidationCategory::InvalidQuantity,
            "bad".to_string(),
        )];
        let summary = ValidationSummary::from_outcomes(&outcomes);
        assert_eq!(summary.error_count, 1);
        assert_eq!(
            summary.by_category.get(&ValidationCategory::InvalidQuantity),
            Some(&1)
        );
        assert!(!summary.can_import);
    }

    #[test]
    fn test_lookup_value_trims_and_defaults() {
        let mut lookup = ColumnLookup::new();
        lookup.insert(ExpectedField::Drawing, "DRAWING*");

        let mut row = RawRow::new();
        row.insert("DRAWING*".to_string(), "  P-001 ".to_string());

        assert_eq!(lookup.value(&row, ExpectedField::Drawing), "P-001");
        assert_eq!(lookup.value(&row, ExpectedField::Qty), "");
        assert!(lookup.is_mapped_header("DRAWING*"));
        assert!(!lookup.is_mapped_header("NOTES"));
    }

    #[test]
    fn test_reducer_constructor_averages() {
        let parsed = ParsedSize::reducer("2X4", 2.0, 4.0);
        assert_eq!(parsed.diameter, Some(3.0));
        assert_eq!(parsed.second_diameter, Some(4.0));
        assert!(parsed.is_reducer);
    }
}
