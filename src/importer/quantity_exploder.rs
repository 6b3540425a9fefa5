// ==========================================
// 施工进度跟踪系统 - 数量展开
// ==========================================
// 职责: 一条已校验行 → N 个离散构件
// - 普通类型: 恰好 qty 个构件,序号 1..=qty,共享属性
// - Threaded_Pipe: 数量为长度,生成 1 个线性管段汇总构件
// 红线: 仅处理校验通过的行
// ==========================================

use crate::domain::identity::ComponentIdentity;
use crate::domain::takeoff::{Component, ComponentAttributes, NormalizedRow};
use crate::domain::types::ComponentType;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::identity_key::{aggregate_pipe_id, build_identity, MAX_SEQUENCE};
use tracing::debug;

/// 展开一条标准化行
///
/// # 参数
/// - row: 校验通过的标准化行
/// - drawing_context_id: 外部数据仓储解析出的图纸标识
///
/// # 返回
/// - Err(InvalidArgument): 数量为负、非有限值或非整数（Threaded_Pipe 除外）
/// - Err(SequenceOutOfRange): 数量超过 999
pub fn explode_quantity(row: &NormalizedRow, drawing_context_id: &str) -> ImportResult<Vec<Component>> {
    if !row.qty.is_finite() || row.qty < 0.0 {
        return Err(ImportError::InvalidArgument {
            name: "qty".to_string(),
            message: format!("数量必须为非负数: {}", row.qty),
        });
    }

    let attributes = shared_attributes(row);

    if row.component_type == ComponentType::ThreadedPipe {
        let pipe_id = aggregate_pipe_id(&row.drawing, &row.size, &row.commodity_code);
        let identity = ComponentIdentity::Aggregate {
            pipe_id,
            size: row.raw_size.clone(),
            total_linear_feet: Some(row.qty),
        };
        return Ok(vec![component(row, drawing_context_id, identity, attributes)]);
    }

    if row.qty.fract() != 0.0 {
        return Err(ImportError::InvalidArgument {
            name: "qty".to_string(),
            message: format!("数量必须为整数: {}", row.qty),
        });
    }

    let count = row.qty as u64;
    if count > MAX_SEQUENCE {
        return Err(ImportError::SequenceOutOfRange(count));
    }

    let components = (1..=count)
        .map(|index| {
            let identity = build_identity(
                &row.drawing,
                &row.size,
                &row.commodity_code,
                index,
                row.component_type,
            )?;
            Ok(component(row, drawing_context_id, identity, attributes.clone()))
        })
        .collect::<ImportResult<Vec<_>>>()?;

    debug!(
        identity = %row.identity_key,
        count = components.len(),
        "行展开完成"
    );

    Ok(components)
}

fn shared_attributes(row: &NormalizedRow) -> ComponentAttributes {
    ComponentAttributes {
        drawing: row.drawing.clone(),
        size: row.size.clone(),
        raw_size: row.raw_size.clone(),
        commodity_code: row.commodity_code.clone(),
        spec: row.spec.clone(),
        description: row.description.clone(),
        comments: row.comments.clone(),
        area: row.area.clone(),
        system: row.system.clone(),
        test_package: row.test_package.clone(),
        original_qty: row.qty,
    }
}

fn component(
    row: &NormalizedRow,
    drawing_context_id: &str,
    identity: ComponentIdentity,
    attributes: ComponentAttributes,
) -> Component {
    Component {
        identity_key: identity.key(),
        identity,
        component_type: row.component_type.storage_name(),
        drawing_id: drawing_context_id.to_string(),
        attributes,
        unmapped_fields: row.unmapped_fields.clone(),
    }
}
