// ==========================================
// 施工进度跟踪系统 - 安装工作量权重计算
// ==========================================
// 职责: 尺寸 + 构件类型 + 可选长度 → 相对工作量权重
// 红线: 永不失败,权重恒 > 0（兜底走固定权重并记录原因）
// ==========================================
// 规则:
// 1. 汇总身份: 尺寸/总长度以附加属性为准,合并后再计算
// 2. 尺寸缺失/非标量/空 → 固定权重（螺纹类 1.0,其他 0.5）
// 3. 预处理: 去英寸符号 / 折叠分数线空白 / 带分数化为假分数 / 折叠 X 两侧空白
// 4. 管径无法解析或 <= 0 → 固定权重
// 5. 线性类型且有长度: d^1.5 × L × 0.1（长度非法退回 d^1.5）
// 6. 其他: d^1.5（异径件取两端平均管径）
// ==========================================

use crate::config::WeightConfig;
use crate::domain::identity::ComponentIdentity;
use crate::domain::takeoff::{
    AuxAttributes, ReducerDiameters, WeightFallbackReason, WeightMetadata, WeightResult,
};
use crate::domain::types::{is_linear_run_type, WeightBasis};
use crate::i18n;
use crate::importer::size_parser::parse_size;
use serde_json::Value;
use tracing::debug;

const SIZE_KEYS: &[&str] = &["size"];
const LENGTH_KEYS: &[&str] = &["total_linear_feet", "linear_feet", "length"];

/// 解析出的尺寸取值
#[derive(Debug, Clone, PartialEq)]
enum SizeValue {
    Missing,
    NonScalar,
    Text(String),
}

/// 解析出的长度取值
#[derive(Debug, Clone, Copy, PartialEq)]
enum LengthValue {
    Absent,
    Invalid,
    Feet(f64),
}

// ==========================================
// WeightCalculator - 权重计算器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightCalculator {
    config: WeightConfig,
}

impl WeightCalculator {
    pub fn new(config: WeightConfig) -> Self {
        Self { config }
    }

    /// 计算单个构件的权重
    ///
    /// # 参数
    /// - identity: 构件身份
    /// - component_type: 构件类型名称（任意大小写）
    /// - aux: 附加属性（size / total_linear_feet 等,键名大小写均可）
    pub fn calculate(
        &self,
        identity: &ComponentIdentity,
        component_type: &str,
        aux: Option<&AuxAttributes>,
    ) -> WeightResult {
        let (size_value, length_value) = resolve_effective_inputs(identity, aux);

        let size_text = match size_value {
            SizeValue::Missing => {
                return self.fallback(component_type, None, WeightFallbackReason::MissingSize)
            }
            SizeValue::NonScalar => {
                return self.fallback(component_type, None, WeightFallbackReason::NonScalarSize)
            }
            SizeValue::Text(text) => text,
        };

        if size_text.trim().is_empty() {
            return self.fallback(
                component_type,
                Some(size_text),
                WeightFallbackReason::EmptySize,
            );
        }

        let prepared = match preprocess_size(&size_text) {
            Some(prepared) => prepared,
            None => {
                return self.fallback(
                    component_type,
                    Some(size_text),
                    WeightFallbackReason::UnparseableSize,
                )
            }
        };

        let parsed = parse_size(&prepared);
        let diameter = match parsed.diameter {
            None => {
                return self.fallback(
                    component_type,
                    Some(size_text),
                    WeightFallbackReason::UnparseableSize,
                )
            }
            Some(d) if d <= 0.0 => {
                return self.fallback(
                    component_type,
                    Some(size_text),
                    WeightFallbackReason::NonPositiveDiameter,
                )
            }
            Some(d) => d,
        };

        let base = diameter.powf(self.config.exponent);
        if !base.is_finite() {
            return self.fallback(
                component_type,
                Some(size_text),
                WeightFallbackReason::UnparseableSize,
            );
        }
        let mut metadata = WeightMetadata {
            size_text: Some(size_text),
            diameter: Some(diameter),
            ..Default::default()
        };

        if parsed.is_reducer {
            if let Some(second) = parsed.second_diameter {
                metadata.reducer = Some(ReducerDiameters {
                    first: 2.0 * diameter - second,
                    second,
                    average: diameter,
                });
            }
        }

        if is_linear_run_type(component_type) {
            match length_value {
                LengthValue::Feet(feet)
                    if (base * feet * self.config.linear_feet_coefficient).is_finite() =>
                {
                    metadata.linear_feet = Some(feet);
                    return WeightResult {
                        weight: base * feet * self.config.linear_feet_coefficient,
                        basis: WeightBasis::LinearFeet,
                        metadata,
                    };
                }
                LengthValue::Feet(_) | LengthValue::Invalid => {
                    metadata.invalid_length = true;
                }
                LengthValue::Absent => {}
            }
        }

        WeightResult {
            weight: base,
            basis: WeightBasis::Dimension,
            metadata,
        }
    }

    fn fallback(
        &self,
        component_type: &str,
        size_text: Option<String>,
        reason: WeightFallbackReason,
    ) -> WeightResult {
        let weight = if component_type.to_lowercase().contains("threaded") {
            self.config.threaded_fallback_weight
        } else {
            self.config.fallback_weight
        };

        debug!(
            component_type = %component_type,
            reason = reason.as_str(),
            weight,
            "使用固定兜底权重"
        );

        WeightResult {
            weight,
            basis: WeightBasis::Fixed,
            metadata: WeightMetadata {
                size_text,
                fallback_reason: Some(reason),
                ..Default::default()
            },
        }
    }
}

/// 使用默认参数计算权重
pub fn calculate_weight(
    identity: &ComponentIdentity,
    component_type: &str,
    aux: Option<&AuxAttributes>,
) -> WeightResult {
    WeightCalculator::default().calculate(identity, component_type, aux)
}

/// 兜底原因的本地化说明
pub fn fallback_message(reason: WeightFallbackReason, size_text: Option<&str>, locale: &str) -> String {
    let key = match reason {
        WeightFallbackReason::MissingSize => "weight.missing_size",
        WeightFallbackReason::NonScalarSize => "weight.non_scalar_size",
        WeightFallbackReason::EmptySize => "weight.empty_size",
        WeightFallbackReason::UnparseableSize => "weight.unparseable_size",
        WeightFallbackReason::NonPositiveDiameter => "weight.non_positive_diameter",
    };
    i18n::t_in(locale, key, &[("size", size_text.unwrap_or(""))])
}

/// 按权重比例分摊工时预算
///
/// # 规则
/// - 各份额之和等于 total_hours
/// - 空输入 → 空输出; total_hours <= 0 或权重和 <= 0 → 全部为 0
pub fn distribute_budget(weights: &[f64], total_hours: f64) -> Vec<f64> {
    let total_weight: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total_hours <= 0.0 || total_weight <= 0.0 {
        return vec![0.0; weights.len()];
    }

    weights
        .iter()
        .map(|w| {
            if w.is_finite() && *w > 0.0 {
                total_hours * w / total_weight
            } else {
                0.0
            }
        })
        .collect()
}

// ==========================================
// 输入解析
// ==========================================

fn resolve_effective_inputs(
    identity: &ComponentIdentity,
    aux: Option<&AuxAttributes>,
) -> (SizeValue, LengthValue) {
    let aux_size = aux.and_then(|a| lookup_either_case(a, SIZE_KEYS));
    let aux_length = aux.and_then(|a| lookup_either_case(a, LENGTH_KEYS));

    match identity {
        ComponentIdentity::Aggregate {
            size,
            total_linear_feet,
            ..
        } => {
            let size_value = match aux_size {
                Some(value) => size_from_value(value),
                None => match size {
                    Some(text) => SizeValue::Text(text.clone()),
                    None => SizeValue::Missing,
                },
            };
            let length_value = match aux_length {
                Some(value) => length_from_value(value),
                None => match total_linear_feet {
                    Some(feet) => length_from_number(*feet),
                    None => LengthValue::Absent,
                },
            };
            (size_value, length_value)
        }
        // 身份中的尺寸为展示口径（"/" 已换成 "X"）,附加属性中的原始尺寸优先
        ComponentIdentity::Discrete { size, .. } | ComponentIdentity::Instrument { size, .. } => {
            let size_value = aux_size
                .map(size_from_value)
                .unwrap_or_else(|| SizeValue::Text(size.clone()));
            let length_value = aux_length.map(length_from_value).unwrap_or(LengthValue::Absent);
            (size_value, length_value)
        }
    }
}

fn lookup_either_case<'a>(aux: &'a AuxAttributes, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(value) = aux.get(*key).or_else(|| aux.get(&key.to_uppercase())) {
            return Some(value);
        }
    }
    None
}

fn size_from_value(value: &Value) -> SizeValue {
    match value {
        Value::Null => SizeValue::Missing,
        Value::String(text) => SizeValue::Text(text.clone()),
        Value::Number(n) => SizeValue::Text(n.to_string()),
        _ => SizeValue::NonScalar,
    }
}

fn length_from_value(value: &Value) -> LengthValue {
    match value {
        Value::Null => LengthValue::Absent,
        Value::Number(n) => n
            .as_f64()
            .map(length_from_number)
            .unwrap_or(LengthValue::Invalid),
        Value::String(text) if text.trim().is_empty() => LengthValue::Absent,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(length_from_number)
            .unwrap_or(LengthValue::Invalid),
        _ => LengthValue::Invalid,
    }
}

fn length_from_number(feet: f64) -> LengthValue {
    // 0 长度会让权重为 0,与负数一样视为非法
    if feet.is_finite() && feet > 0.0 {
        LengthValue::Feet(feet)
    } else {
        LengthValue::Invalid
    }
}

// ==========================================
// 尺寸预处理
// ==========================================

/// 尺寸文本预处理,返回 None 表示异径件缺少一侧内容
fn preprocess_size(text: &str) -> Option<String> {
    let stripped = strip_inch_marks(text);

    // X 两侧补空格,分数线两侧去空格,便于按词处理
    let mut spaced = String::with_capacity(stripped.len() + 4);
    for c in stripped.chars() {
        match c {
            'X' | 'x' => {
                spaced.push(' ');
                spaced.push('X');
                spaced.push(' ');
            }
            '/' => {
                while spaced.ends_with(char::is_whitespace) {
                    spaced.pop();
                }
                spaced.push('/');
            }
            c if c.is_whitespace() && spaced.ends_with('/') => {}
            c => spaced.push(c),
        }
    }

    let words = merge_mixed_numbers(spaced.split_whitespace().collect());

    let has_cross = words.iter().any(|w| w == "X");
    if has_cross {
        let cross_at = words.iter().position(|w| w == "X")?;
        if cross_at == 0 || cross_at + 1 >= words.len() {
            return None;
        }
    }

    let mut prepared = String::new();
    for (idx, word) in words.iter().enumerate() {
        let previous_is_cross = idx > 0 && words[idx - 1] == "X";
        if idx > 0 && word != "X" && !previous_is_cross {
            prepared.push(' ');
        }
        prepared.push_str(word);
    }
    Some(prepared)
}

fn strip_inch_marks(text: &str) -> String {
    text.replace("''", "")
        .chars()
        .filter(|c| !matches!(c, '"' | '\u{201C}' | '\u{201D}' | '\u{2033}'))
        .collect()
}

/// 带分数 → 假分数（"1 1/2" / "1-1/2" → "3/2"）
fn merge_mixed_numbers(words: Vec<&str>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(words.len());
    let mut idx = 0;

    while idx < words.len() {
        let word = words[idx];

        if let Some((whole, fraction)) = word.split_once('-') {
            if let Some(improper) = to_improper_fraction(whole, fraction) {
                merged.push(improper);
                idx += 1;
                continue;
            }
        }

        if let Some(next) = words.get(idx + 1) {
            if let Some(improper) = to_improper_fraction(word, next) {
                merged.push(improper);
                idx += 2;
                continue;
            }
        }

        merged.push(word.to_string());
        idx += 1;
    }

    merged
}

fn to_improper_fraction(whole: &str, fraction: &str) -> Option<String> {
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (numerator, denominator) = fraction.split_once('/')?;
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(numerator) || !all_digits(denominator) {
        return None;
    }

    let whole: u64 = whole.parse().ok()?;
    let numerator: u64 = numerator.parse().ok()?;
    let denominator: u64 = denominator.parse().ok()?;
    if denominator == 0 {
        return None;
    }

    let combined = whole.checked_mul(denominator)?.checked_add(numerator)?;
    Some(format!("{}/{}", combined, denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn discrete(size: &str) -> ComponentIdentity {
        ComponentIdentity::Discrete {
            drawing: "P-001".to_string(),
            size: size.to_string(),
            commodity_code: "C1".to_string(),
            seq: 1,
        }
    }

    fn aux(value: serde_json::Value) -> AuxAttributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_dimension_weight() {
        let result = calculate_weight(&discrete("4"), "Valve", None);
        assert_eq!(result.basis, WeightBasis::Dimension);
        assert!((result.weight - 4f64.powf(1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_linear_feet_weight() {
        let attrs = aux(json!({ "linear_feet": 10 }));
        let result = calculate_weight(&discrete("2"), "Threaded_Pipe", Some(&attrs));
        assert_eq!(result.basis, WeightBasis::LinearFeet);
        assert!((result.weight - 2f64.powf(1.5) * 10.0 * 0.1).abs() < 1e-9);
        assert!((result.weight - 2.828).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_length_falls_back_to_dimension() {
        let attrs = aux(json!({ "total_linear_feet": -5 }));
        let result = calculate_weight(&discrete("2"), "Pipe", Some(&attrs));
        assert_eq!(result.basis, WeightBasis::Dimension);
        assert!(result.metadata.invalid_length);
        assert!((result.weight - 2f64.powf(1.5)).abs() < 1e-9);

        let attrs = aux(json!({ "LINEAR_FEET": "abc" }));
        let result = calculate_weight(&discrete("2"), "Pipe", Some(&attrs));
        assert_eq!(result.basis, WeightBasis::Dimension);
    }

    #[test]
    fn test_length_ignored_for_discrete_types() {
        let attrs = aux(json!({ "linear_feet": 10 }));
        let result = calculate_weight(&discrete("2"), "Valve", Some(&attrs));
        assert_eq!(result.basis, WeightBasis::Dimension);
    }

    #[test]
    fn test_missing_size_fallbacks() {
        let identity = ComponentIdentity::Aggregate {
            pipe_id: "P-001-TP".to_string(),
            size: None,
            total_linear_feet: None,
        };
        let result = calculate_weight(&identity, "Valve", None);
        assert_eq!(result.weight, 0.5);
        assert_eq!(result.basis, WeightBasis::Fixed);
        assert_eq!(
            result.metadata.fallback_reason,
            Some(WeightFallbackReason::MissingSize)
        );

        let result = calculate_weight(&identity, "Threaded_Pipe", None);
        assert_eq!(result.weight, 1.0);
        assert_eq!(result.basis, WeightBasis::Fixed);
    }

    #[test]
    fn test_empty_and_unparseable_sizes() {
        let result = calculate_weight(&discrete("  "), "Valve", None);
        assert_eq!(result.basis, WeightBasis::Fixed);
        assert_eq!(
            result.metadata.fallback_reason,
            Some(WeightFallbackReason::EmptySize)
        );

        let result = calculate_weight(&discrete("NOSIZE"), "Valve", None);
        assert_eq!(result.weight, 0.5);
        assert_eq!(
            result.metadata.fallback_reason,
            Some(WeightFallbackReason::UnparseableSize)
        );

        let result = calculate_weight(&discrete("0"), "Valve", None);
        assert_eq!(
            result.metadata.fallback_reason,
            Some(WeightFallbackReason::NonPositiveDiameter)
        );
    }

    #[test]
    fn test_reducer_metadata() {
        let result = calculate_weight(&discrete("2X4"), "Fitting", None);
        assert_eq!(result.basis, WeightBasis::Dimension);
        assert!((result.weight - 3f64.powf(1.5)).abs() < 1e-9);

        let reducer = result.metadata.reducer.unwrap();
        assert_eq!(reducer.first, 2.0);
        assert_eq!(reducer.second, 4.0);
        assert_eq!(reducer.average, 3.0);
    }

    #[test]
    fn test_reducer_missing_side_is_fallback() {
        let result = calculate_weight(&discrete("2 X "), "Fitting", None);
        assert_eq!(result.basis, WeightBasis::Fixed);
        let result = calculate_weight(&discrete("x4"), "Fitting", None);
        assert_eq!(result.basis, WeightBasis::Fixed);
    }

    #[test]
    fn test_preprocess_inch_marks_and_mixed_numbers() {
        let result = calculate_weight(&discrete("4\""), "Valve", None);
        assert!((result.weight - 8.0).abs() < 1e-9);

        let result = calculate_weight(&discrete("1 1/2\""), "Valve", None);
        assert!((result.weight - 1.5f64.powf(1.5)).abs() < 1e-9);

        let result = calculate_weight(&discrete("1-1/2 x 3 / 4"), "Fitting", None);
        let reducer = result.metadata.reducer.unwrap();
        assert!((reducer.first - 1.5).abs() < 1e-9);
        assert!((reducer.second - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_merges_aux_attributes() {
        let identity = ComponentIdentity::Aggregate {
            pipe_id: "P-001-2-TP".to_string(),
            size: None,
            total_linear_feet: None,
        };
        let attrs = aux(json!({ "SIZE": "2", "total_linear_feet": 10.0 }));
        let result = calculate_weight(&identity, "Threaded_Pipe", Some(&attrs));
        assert_eq!(result.basis, WeightBasis::LinearFeet);
        assert!((result.weight - 2f64.powf(1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_discrete_prefers_raw_size_from_aux() {
        let attrs = aux(json!({ "size": "1/2" }));
        let result = calculate_weight(&discrete("1X2"), "Valve", Some(&attrs));
        assert!(result.metadata.reducer.is_none());
        assert!((result.weight - 0.5f64.powf(1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_overflowing_weight_stays_finite() {
        let huge = format!("1{}", "0".repeat(250));
        let result = calculate_weight(&discrete(&huge), "Valve", None);
        assert_eq!(result.basis, WeightBasis::Fixed);
        assert_eq!(result.weight, 0.5);

        let large = format!("1{}", "0".repeat(200));
        let attrs = aux(json!({ "linear_feet": 1e10 }));
        let result = calculate_weight(&discrete(&large), "Pipe", Some(&attrs));
        assert_eq!(result.basis, WeightBasis::Dimension);
        assert!(result.weight.is_finite() && result.weight > 0.0);
        assert!(result.metadata.invalid_length);
    }

    #[test]
    fn test_non_scalar_size() {
        let identity = ComponentIdentity::Aggregate {
            pipe_id: "P-1".to_string(),
            size: None,
            total_linear_feet: None,
        };
        let attrs = aux(json!({ "size": ["2", "4"] }));
        let result = calculate_weight(&identity, "Pipe", Some(&attrs));
        assert_eq!(result.weight, 0.5);
        assert_eq!(
            result.metadata.fallback_reason,
            Some(WeightFallbackReason::NonScalarSize)
        );
    }

    #[test]
    fn test_custom_config() {
        let calculator = WeightCalculator::new(WeightConfig {
            exponent: 2.0,
            ..Default::default()
        });
        let result = calculator.calculate(&discrete("3"), "Valve", None);
        assert!((result.weight - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_message() {
        let result = calculate_weight(&discrete("abc"), "Valve", None);
        let reason = result.metadata.fallback_reason.unwrap();
        let message = fallback_message(reason, result.metadata.size_text.as_deref(), "en");
        assert_eq!(message, "Size 'abc' cannot be parsed, fixed weight used");

        let message = fallback_message(WeightFallbackReason::MissingSize, None, "zh-CN");
        assert_eq!(message, "尺寸缺失，使用固定权重");
    }

    #[test]
    fn test_distribute_budget() {
        let shares = distribute_budget(&[1.0, 3.0], 100.0);
        assert_eq!(shares, vec![25.0, 75.0]);

        assert!(distribute_budget(&[], 100.0).is_empty());
        assert_eq!(distribute_budget(&[1.0, 2.0], 0.0), vec![0.0, 0.0]);
    }
}
