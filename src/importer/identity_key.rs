// ==========================================
// 施工进度跟踪系统 - 身份键生成
// ==========================================
// 职责: 图号/尺寸标准化 + 构件身份键构造
// 规则:
// - Instrument: 图号-尺寸-物料编码（无序号,同组有意碰撞）
// - 其他类型:   图号-尺寸-物料编码-序号（3 位补零,1..=999）
// ==========================================

use crate::domain::identity::ComponentIdentity;
use crate::domain::types::ComponentType;
use crate::importer::error::{ImportError, ImportResult};

/// 单组内最大序号
pub const MAX_SEQUENCE: u64 = 999;

/// 无尺寸时的占位值
pub const NO_SIZE: &str = "NOSIZE";

/// 图号标准化: 大写 + TRIM + 内部空白折叠为单个空格
pub fn normalize_drawing(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// 尺寸展示口径: "/" → "X",去掉英寸引号,空 → NOSIZE
///
/// # 示例
/// - "1/2" → "1X2"
/// - "2\"" → "2"
/// - "" → "NOSIZE"
pub fn normalize_display_size(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2033}'))
        .map(|c| if c == '/' { 'X' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        NO_SIZE.to_string()
    } else {
        cleaned.to_string()
    }
}

/// 构造构件身份
///
/// # 参数
/// - drawing_norm: 已标准化图号
/// - size: 尺寸（内部按展示口径标准化）
/// - commodity_code: 物料编码
/// - index: 组内序号（Instrument 忽略）
/// - component_type: 构件类型
///
/// # 返回
/// - Err(SequenceOutOfRange): 非 Instrument 且序号不在 1..=999
pub fn build_identity(
    drawing_norm: &str,
    size: &str,
    commodity_code: &str,
    index: u64,
    component_type: ComponentType,
) -> ImportResult<ComponentIdentity> {
    let size = normalize_display_size(size);
    let commodity_code = commodity_code.trim().to_string();

    if component_type == ComponentType::Instrument {
        return Ok(ComponentIdentity::Instrument {
            drawing: drawing_norm.to_string(),
            size,
            commodity_code,
        });
    }

    if index == 0 || index > MAX_SEQUENCE {
        return Err(ImportError::SequenceOutOfRange(index));
    }

    Ok(ComponentIdentity::Discrete {
        drawing: drawing_norm.to_string(),
        size,
        commodity_code,
        seq: index as u32,
    })
}

/// 生成身份键字符串
///
/// qty 不参与构造,仅保持与调用方一致的参数形态。
pub fn generate_identity_key(
    drawing_norm: &str,
    size: &str,
    commodity_code: &str,
    index: u64,
    _qty: f64,
    component_type: ComponentType,
) -> ImportResult<String> {
    build_identity(drawing_norm, size, commodity_code, index, component_type).map(|id| id.key())
}

/// 线性管段汇总标识: 图号-尺寸-物料编码
pub fn aggregate_pipe_id(drawing_norm: &str, size: &str, commodity_code: &str) -> String {
    format!(
        "{}-{}-{}",
        drawing_norm,
        normalize_display_size(size),
        commodity_code.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_key() {
        let key = generate_identity_key("P-001", "2", "VBALL", 1, 3.0, ComponentType::Valve).unwrap();
        assert_eq!(key, "P-001-2-VBALL-001");

        let key = generate_identity_key("P-001", "1/2", "EL90", 42, 1.0, ComponentType::Fitting)
            .unwrap();
        assert_eq!(key, "P-001-1X2-EL90-042");
    }

    #[test]
    fn test_instrument_key_has_no_sequence() {
        let a = generate_identity_key("P-001", "1", "PT-1", 1, 1.0, ComponentType::Instrument)
            .unwrap();
        let b = generate_identity_key("P-001", "1", "PT-1", 5, 1.0, ComponentType::Instrument)
            .unwrap();
        assert_eq!(a, "P-001-1-PT-1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_sequence_out_of_range() {
        let result = generate_identity_key("P", "2", "C", 1000, 1.0, ComponentType::Valve);
        assert!(matches!(result, Err(ImportError::SequenceOutOfRange(1000))));

        let result = generate_identity_key("P", "2", "C", 0, 1.0, ComponentType::Valve);
        assert!(matches!(result, Err(ImportError::SequenceOutOfRange(0))));

        let key = generate_identity_key("P", "2", "C", 999, 1.0, ComponentType::Valve).unwrap();
        assert!(key.ends_with("-999"));
    }

    #[test]
    fn test_qty_does_not_affect_key() {
        let a = generate_identity_key("P", "2", "C", 1, 1.0, ComponentType::Pipe).unwrap();
        let b = generate_identity_key("P", "2", "C", 1, 250.0, ComponentType::Pipe).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_display_size() {
        assert_eq!(normalize_display_size("1/2"), "1X2");
        assert_eq!(normalize_display_size(" 2\" "), "2");
        assert_eq!(normalize_display_size("3''"), "3");
        assert_eq!(normalize_display_size(""), "NOSIZE");
        assert_eq!(normalize_display_size("\"\""), "NOSIZE");
    }

    #[test]
    fn test_normalize_drawing() {
        assert_eq!(normalize_drawing("  p-001   rev  a "), "P-001 REV A");
    }

    #[test]
    fn test_aggregate_pipe_id() {
        assert_eq!(aggregate_pipe_id("P-001", "1/2", " TP1 "), "P-001-1X2-TP1");
    }
}
