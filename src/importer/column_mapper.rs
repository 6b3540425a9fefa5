// ==========================================
// 施工进度跟踪系统 - 表头映射器
// ==========================================
// 职责: 任意表头 → 标准字段 + 置信度层级
// ==========================================
// 规则:
// - 表头按输入顺序处理,先去掉末尾标记符（*+!# 任意组合,仅末尾）
// - 依次尝试 exact → case-insensitive → synonym,首个命中的层级生效
// - 每个标准字段一次调用内最多被认领一次,先到先得
//   （即使后面的表头能以更高层级命中,也不会抢走已认领字段）
// ==========================================

use crate::domain::takeoff::{ColumnMapping, MappingResult};
use crate::domain::types::{ExpectedField, MatchTier};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// 表头末尾的标记符（必填/提示标记）
const HEADER_MARKERS: &[char] = &['*', '+', '!', '#'];

/// 内置同义词（大写）
fn builtin_synonyms(field: ExpectedField) -> &'static [&'static str] {
    match field {
        ExpectedField::Drawing => &[
            "DWG",
            "DWG NO",
            "DRAWING NO",
            "DRAWING NUMBER",
            "ISO",
            "ISOMETRIC",
            "LINE NUMBER",
        ],
        ExpectedField::Type => &["COMPONENT TYPE", "ITEM TYPE", "CATEGORY", "COMPONENT"],
        ExpectedField::Qty => &["QUANTITY", "COUNT", "QTY.", "AMOUNT"],
        ExpectedField::CmdtyCode => &[
            "COMMODITY CODE",
            "COMMODITY",
            "CMDTY",
            "CMDTY_CODE",
            "CMDTYCODE",
            "ITEM CODE",
        ],
        ExpectedField::Size => &["NPS", "DIAMETER", "DIA", "NOMINAL SIZE", "PIPE SIZE"],
        ExpectedField::Spec => &["SPECIFICATION", "PIPE SPEC", "PIPING SPEC", "CLASS"],
        ExpectedField::Description => &["DESC", "ITEM DESCRIPTION", "MATERIAL DESCRIPTION"],
        ExpectedField::Comments => &["COMMENT", "NOTES", "NOTE", "REMARKS"],
        ExpectedField::Area => &["UNIT", "PLANT AREA", "ZONE"],
        ExpectedField::System => &["SYS", "SYSTEM NO", "SYSTEM NUMBER"],
        ExpectedField::TestPackage => &["TEST PACKAGE", "TEST PKG", "TEST_PKG", "TP", "PACKAGE"],
    }
}

/// 去掉表头末尾的标记符（中间的标记符保留）
///
/// # 示例
/// - "DRAWING*" → "DRAWING"
/// - "QTY*+!" → "QTY"
/// - "A*B" → "A*B"
pub fn normalize_header(header: &str) -> &str {
    header
        .trim()
        .trim_end_matches(HEADER_MARKERS)
        .trim_end()
}

// ==========================================
// ColumnMapper - 表头映射器
// ==========================================
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    synonyms: BTreeMap<ExpectedField, Vec<String>>,
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnMapper {
    /// 使用内置同义词创建
    pub fn new() -> Self {
        let synonyms = ExpectedField::ALL
            .iter()
            .map(|field| {
                let list = builtin_synonyms(*field)
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                (*field, list)
            })
            .collect();
        Self { synonyms }
    }

    /// 内置同义词 + 配置中的额外同义词（未知字段名忽略）
    pub fn with_extra_synonyms(extra: &BTreeMap<String, Vec<String>>) -> Self {
        let mut mapper = Self::new();
        for (literal, words) in extra {
            let Some(field) = ExpectedField::from_literal(literal) else {
                debug!(field = %literal, "忽略未知字段的同义词配置");
                continue;
            };
            let list = mapper.synonyms.entry(field).or_default();
            for word in words {
                let upper = word.trim().to_uppercase();
                if !upper.is_empty() && !list.contains(&upper) {
                    list.push(upper);
                }
            }
        }
        mapper
    }

    /// 映射表头
    ///
    /// # 参数
    /// - headers: 原始表头（保持输入顺序）
    ///
    /// # 返回
    /// - MappingResult: 映射 / 未映射表头 / 缺失必填字段
    pub fn map_columns<S: AsRef<str>>(&self, headers: &[S]) -> MappingResult {
        let mut claimed: HashSet<ExpectedField> = HashSet::new();
        let mut mappings = Vec::new();
        let mut unmapped_headers = Vec::new();

        for header in headers {
            let header = header.as_ref();
            match self.match_header(header, &claimed) {
                Some((field, tier)) => {
                    claimed.insert(field);
                    mappings.push(ColumnMapping::new(header, field, tier));
                }
                None => unmapped_headers.push(header.to_string()),
            }
        }

        let missing_required_fields: Vec<ExpectedField> = ExpectedField::REQUIRED
            .iter()
            .copied()
            .filter(|field| !claimed.contains(field))
            .collect();

        debug!(
            mapped = mappings.len(),
            unmapped = unmapped_headers.len(),
            missing_required = missing_required_fields.len(),
            "表头映射完成"
        );

        MappingResult {
            has_all_required_fields: missing_required_fields.is_empty(),
            mappings,
            unmapped_headers,
            missing_required_fields,
        }
    }

    /// 单个表头: 逐层级尝试,跳过已认领字段
    fn match_header(
        &self,
        header: &str,
        claimed: &HashSet<ExpectedField>,
    ) -> Option<(ExpectedField, MatchTier)> {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            return None;
        }
        let upper = normalized.to_uppercase();

        for tier in MatchTier::ORDERED {
            for field in ExpectedField::ALL {
                if claimed.contains(&field) {
                    continue;
                }
                let hit = match tier {
                    MatchTier::Exact => normalized == field.literal(),
                    MatchTier::CaseInsensitive => upper == field.literal(),
                    MatchTier::Synonym => self
                        .synonyms
                        .get(&field)
                        .is_some_and(|list| list.iter().any(|s| *s == upper)),
                };
                if hit {
                    return Some((field, tier));
                }
            }
        }

        None
    }
}

/// 使用内置同义词映射表头
pub fn map_columns<S: AsRef<str>>(headers: &[S]) -> MappingResult {
    ColumnMapper::new().map_columns(headers)
}
