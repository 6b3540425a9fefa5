// ==========================================
// 施工进度跟踪系统 - 行校验器
// ==========================================
// 职责: 每行判定 valid / skipped / error,首个失败检查即短路
// 检查顺序:
//   1. DRAWING 为空          → error(empty_drawing)
//   2. TYPE 为空             → error(missing_required_field)
//   3. CMDTY CODE 为空       → error(missing_required_field)
//   4. QTY 空/非数字/负数/非整数/超过 999 → error(...)
//      （TYPE 字面为 Threaded_Pipe 时允许小数;按长度计量的类型不受 999 上限约束）
//   5. QTY == 0              → skipped(zero_quantity)
//   6. TYPE 不在白名单       → skipped(unsupported_type)
//   7. 身份键本批次重复      → error(duplicate_identity_key)（Threaded_Pipe 除外）
//   8. 生成标准化行          → valid
// 红线: 除调用方传入的重复键集合外无副作用
// ==========================================

use crate::domain::identity::ComponentIdentity;
use crate::domain::takeoff::{ColumnLookup, NormalizedRow, RawRow, ValidationOutcome};
use crate::domain::types::{normalize_type_name, ComponentType, ExpectedField, ValidationCategory};
use crate::i18n;
use crate::importer::duplicate_keys::KeyRegistry;
use crate::importer::identity_key::{normalize_display_size, normalize_drawing, MAX_SEQUENCE};
use std::collections::BTreeMap;
use tracing::debug;

/// 允许小数数量的类型字面值
const THREADED_PIPE_LITERAL: &str = "Threaded_Pipe";

/// 数量检查结果
enum QtyCheck {
    Ok(f64),
    Fail(ValidationCategory, String),
}

// ==========================================
// RowValidator - 行校验器
// ==========================================
#[derive(Debug, Clone)]
pub struct RowValidator {
    locale: String, // 原因文本语言
}

impl Default for RowValidator {
    fn default() -> Self {
        Self::new("en")
    }
}

impl RowValidator {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// 校验整批行（行号从 1 开始）
    pub fn validate_rows<R: KeyRegistry + ?Sized>(
        &self,
        rows: &[RawRow],
        lookup: &ColumnLookup,
        registry: &mut R,
    ) -> Vec<ValidationOutcome> {
        self.validate_rows_from(rows, lookup, registry, 1)
    }

    /// 校验一个分块
    ///
    /// # 参数
    /// - first_row_number: 本块第一行在整批中的行号（保持跨块连续编号）
    /// - registry: 整批共用的重复键集合
    pub fn validate_rows_from<R: KeyRegistry + ?Sized>(
        &self,
        rows: &[RawRow],
        lookup: &ColumnLookup,
        registry: &mut R,
        first_row_number: usize,
    ) -> Vec<ValidationOutcome> {
        rows.iter()
            .enumerate()
            .map(|(offset, row)| {
                let outcome = self.validate_row(row, first_row_number + offset, lookup, registry);
                if let (Some(category), Some(reason)) = (outcome.category, &outcome.reason) {
                    debug!(
                        row = outcome.row_number,
                        status = %outcome.status,
                        category = %category,
                        reason = %reason,
                        "行未通过校验"
                    );
                }
                outcome
            })
            .collect()
    }

    /// 校验单行
    pub fn validate_row<R: KeyRegistry + ?Sized>(
        &self,
        row: &RawRow,
        row_number: usize,
        lookup: &ColumnLookup,
        registry: &mut R,
    ) -> ValidationOutcome {
        let drawing = lookup.value(row, ExpectedField::Drawing);
        let raw_type = lookup.value(row, ExpectedField::Type);
        let commodity_code = lookup.value(row, ExpectedField::CmdtyCode);
        let qty_text = lookup.value(row, ExpectedField::Qty);

        // 1. 图号
        if drawing.is_empty() {
            return ValidationOutcome::error(
                row_number,
                ValidationCategory::EmptyDrawing,
                self.reason("validation.empty_drawing", &[]),
            );
        }

        // 2-3. 必填文本字段
        for (field, value) in [
            (ExpectedField::Type, raw_type),
            (ExpectedField::CmdtyCode, commodity_code),
        ] {
            if value.is_empty() {
                return self.missing_field(row_number, field);
            }
        }

        // 4. 数量
        let component_type = ComponentType::parse(raw_type);
        let qty = match self.check_quantity(qty_text, raw_type, component_type) {
            QtyCheck::Ok(qty) => qty,
            QtyCheck::Fail(category, reason) => {
                return ValidationOutcome::error(row_number, category, reason);
            }
        };

        // 5. 零数量: 增量清单中合法存在,仅跳过
        if qty == 0.0 {
            return ValidationOutcome::skipped(
                row_number,
                ValidationCategory::ZeroQuantity,
                self.reason("validation.zero_quantity", &[]),
            );
        }

        // 6. 类型白名单
        let Some(component_type) = component_type else {
            return ValidationOutcome::skipped(
                row_number,
                ValidationCategory::UnsupportedType,
                self.reason("validation.unsupported_type", &[("type", raw_type)]),
            );
        };

        // 7. 批次内重复（Threaded_Pipe 的重复行由导入器按长度合并）
        let drawing_norm = normalize_drawing(drawing);
        let raw_size = lookup.value(row, ExpectedField::Size);
        let identity_key = group_identity(&drawing_norm, raw_size, commodity_code, component_type).key();
        let first_seen = registry.register(&identity_key);
        if !first_seen && component_type != ComponentType::ThreadedPipe {
            return ValidationOutcome::error(
                row_number,
                ValidationCategory::DuplicateIdentityKey,
                self.reason("validation.duplicate_identity_key", &[("key", &identity_key)]),
            );
        }

        // 8. 标准化
        let optional = |field: ExpectedField| {
            let value = lookup.value(row, field);
            (!value.is_empty()).then(|| value.to_string())
        };

        let unmapped_fields: BTreeMap<String, String> = row
            .iter()
            .filter(|(header, _)| !lookup.is_mapped_header(header))
            .map(|(header, value)| (header.clone(), value.clone()))
            .collect();

        ValidationOutcome::valid(
            row_number,
            NormalizedRow {
                drawing: drawing_norm,
                component_type,
                raw_type: raw_type.to_string(),
                qty,
                commodity_code: commodity_code.to_string(),
                size: normalize_display_size(raw_size),
                raw_size: (!raw_size.is_empty()).then(|| raw_size.to_string()),
                spec: optional(ExpectedField::Spec),
                description: optional(ExpectedField::Description),
                comments: optional(ExpectedField::Comments),
                area: optional(ExpectedField::Area),
                system: optional(ExpectedField::System),
                test_package: optional(ExpectedField::TestPackage),
                identity_key,
                unmapped_fields,
            },
        )
    }

    /// 数量检查
    ///
    /// 小数例外只认字面 "Threaded_Pipe"（空白换成下划线后区分大小写）。
    /// 离散构件每组最多 999 个单元,超出即判为无效数量。
    fn check_quantity(
        &self,
        text: &str,
        raw_type: &str,
        component_type: Option<ComponentType>,
    ) -> QtyCheck {
        if text.is_empty() {
            let reason = self.reason(
                "validation.missing_required_field",
                &[("field", ExpectedField::Qty.literal())],
            );
            return QtyCheck::Fail(ValidationCategory::MissingRequiredField, reason);
        }

        let value = match text.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                let reason = self.reason("validation.invalid_quantity_non_numeric", &[("value", text)]);
                return QtyCheck::Fail(ValidationCategory::InvalidQuantity, reason);
            }
        };

        if value < 0.0 {
            let reason = self.reason("validation.invalid_quantity_negative", &[("value", text)]);
            return QtyCheck::Fail(ValidationCategory::InvalidQuantity, reason);
        }

        if normalize_type_name(raw_type) == THREADED_PIPE_LITERAL {
            return QtyCheck::Ok(value);
        }

        if value.fract() != 0.0 {
            let reason = self.reason(
                "validation.invalid_quantity_non_integer",
                &[("value", text), ("type", raw_type)],
            );
            return QtyCheck::Fail(ValidationCategory::InvalidQuantity, reason);
        }

        // 线性管段合并为一条汇总记录,不分配序号
        if component_type != Some(ComponentType::ThreadedPipe) && value > MAX_SEQUENCE as f64 {
            let max = MAX_SEQUENCE.to_string();
            let reason = self.reason(
                "validation.invalid_quantity_too_large",
                &[("value", text), ("max", max.as_str())],
            );
            return QtyCheck::Fail(ValidationCategory::InvalidQuantity, reason);
        }

        QtyCheck::Ok(value)
    }

    fn missing_field(&self, row_number: usize, field: ExpectedField) -> ValidationOutcome {
        ValidationOutcome::error(
            row_number,
            ValidationCategory::MissingRequiredField,
            self.reason("validation.missing_required_field", &[("field", field.literal())]),
        )
    }

    fn reason(&self, key: &str, args: &[(&str, &str)]) -> String {
        i18n::t_in(&self.locale, key, args)
    }
}

/// 行级身份（组内第 1 个单元）
///
/// 序号固定为 1,不会越界,直接构造而不经过带校验的生成函数。
fn group_identity(
    drawing_norm: &str,
    raw_size: &str,
    commodity_code: &str,
    component_type: ComponentType,
) -> ComponentIdentity {
    let size = normalize_display_size(raw_size);
    let commodity_code = commodity_code.to_string();
    let drawing = drawing_norm.to_string();
    match component_type {
        ComponentType::Instrument => ComponentIdentity::Instrument {
            drawing,
            size,
            commodity_code,
        },
        _ => ComponentIdentity::Discrete {
            drawing,
            size,
            commodity_code,
            seq: 1,
        },
    }
}

/// 使用默认语言校验整批行
pub fn validate_rows<R: KeyRegistry + ?Sized>(
    rows: &[RawRow],
    lookup: &ColumnLookup,
    registry: &mut R,
) -> Vec<ValidationOutcome> {
    RowValidator::default().validate_rows(rows, lookup, registry)
}
