// ==========================================
// 施工进度跟踪系统 - 构件身份
// ==========================================
// 职责: 以带标签的变体表达三种身份形态
// - Discrete:   图号-尺寸-物料编码-序号（普通离散构件）
// - Instrument: 图号-尺寸-物料编码（仪表,无序号,同组有意碰撞）
// - Aggregate:  线性管段汇总（尺寸/总长度可能存放在附加属性中）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentIdentity {
    Discrete {
        drawing: String,
        size: String,
        commodity_code: String,
        seq: u32,
    },
    Instrument {
        drawing: String,
        size: String,
        commodity_code: String,
    },
    Aggregate {
        pipe_id: String,
        #[serde(default)]
        size: Option<String>,
        #[serde(default)]
        total_linear_feet: Option<f64>,
    },
}

impl ComponentIdentity {
    /// 渲染为身份键字符串
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// 身份中携带的尺寸文本（汇总身份可能为空）
    pub fn size(&self) -> Option<&str> {
        match self {
            ComponentIdentity::Discrete { size, .. } | ComponentIdentity::Instrument { size, .. } => {
                Some(size.as_str())
            }
            ComponentIdentity::Aggregate { size, .. } => size.as_deref(),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, ComponentIdentity::Aggregate { .. })
    }
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentIdentity::Discrete {
                drawing,
                size,
                commodity_code,
                seq,
            } => write!(f, "{}-{}-{}-{:03}", drawing, size, commodity_code, seq),
            ComponentIdentity::Instrument {
                drawing,
                size,
                commodity_code,
            } => write!(f, "{}-{}-{}", drawing, size, commodity_code),
            ComponentIdentity::Aggregate { pipe_id, .. } => write!(f, "{}", pipe_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_key_zero_padded() {
        let identity = ComponentIdentity::Discrete {
            drawing: "P-001".to_string(),
            size: "2".to_string(),
            commodity_code: "VBALL".to_string(),
            seq: 7,
        };
        assert_eq!(identity.key(), "P-001-2-VBALL-007");
    }

    #[test]
    fn test_instrument_key_has_no_suffix() {
        let identity = ComponentIdentity::Instrument {
            drawing: "P-001".to_string(),
            size: "1X2".to_string(),
            commodity_code: "PT-100".to_string(),
        };
        assert_eq!(identity.key(), "P-001-1X2-PT-100");
    }

    #[test]
    fn test_aggregate_serde_tag() {
        let identity = ComponentIdentity::Aggregate {
            pipe_id: "P-001-2-TP".to_string(),
            size: None,
            total_linear_feet: Some(12.5),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["kind"], "aggregate");
        assert_eq!(identity.size(), None);
        assert!(identity.is_aggregate());
    }
}
