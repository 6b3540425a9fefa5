// ==========================================
// 施工进度跟踪系统 - 材料清单导入器
// ==========================================
// 职责: 整合导入流程,从表格到外部数据仓储
// 流程: 解析 → 表头映射 → 行校验 → 汇总 → 合并线性管段 → 展开 → 权重 → 落库
// 红线:
// - 重复键集合每批次新建,批次之间、并发导入之间互不共享
// - 存在 error 行时不落库（配置 allow_errors 显式放行除外）
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::identity::ComponentIdentity;
use crate::domain::takeoff::{
    ColumnLookup, ComponentAttributes, ImportReport, MappingResult, NormalizedRow, RawRow,
    RawSheet, ValidationOutcome, ValidationSummary, WeightResult, WeightedComponent,
};
use crate::domain::types::ComponentType;
use crate::importer::column_mapper::ColumnMapper;
use crate::importer::duplicate_keys::{BatchKeySet, KeyRegistry, SharedBatchKeySet};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::identity_key::aggregate_pipe_id;
use crate::importer::importer_trait::{ComponentRepository, FileParser};
use crate::importer::quantity_exploder::explode_quantity;
use crate::importer::row_validator::RowValidator;
use crate::importer::weight_calculator::WeightCalculator;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// TakeoffImporter - 材料清单导入器
// ==========================================
pub struct TakeoffImporter<R, C>
where
    R: ComponentRepository,
    C: ImportConfigReader,
{
    // 外部数据仓储
    repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    column_mapper: ColumnMapper,
    row_validator: RowValidator,
    weight_calculator: WeightCalculator,
}

impl<R, C> TakeoffImporter<R, C>
where
    R: ComponentRepository,
    C: ImportConfigReader,
{
    /// 创建导入器（组件参数取自配置）
    ///
    /// # 返回
    /// - Err(ConfigValueError): 权重参数非正数或块大小为 0
    pub fn new(repo: R, config: C) -> ImportResult<Self> {
        let weight_config = config.weight_config();
        weight_config.validate()?;
        if config.chunk_size() == 0 {
            return Err(ImportError::ConfigValueError {
                key: "chunk_size".to_string(),
                value: "0".to_string(),
                message: "块大小必须大于 0".to_string(),
            });
        }

        let column_mapper = ColumnMapper::with_extra_synonyms(&config.extra_synonyms());
        let row_validator = RowValidator::new(&config.locale());
        let weight_calculator = WeightCalculator::new(weight_config);

        Ok(Self {
            repo,
            config,
            file_parser: Box::new(UniversalFileParser),
            column_mapper,
            row_validator,
            weight_calculator,
        })
    }

    /// 替换文件解析器
    pub fn with_file_parser(mut self, file_parser: Box<dyn FileParser>) -> Self {
        self.file_parser = file_parser;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// 表头映射
    pub fn map_headers<S: AsRef<str>>(&self, headers: &[S]) -> MappingResult {
        self.column_mapper.map_columns(headers)
    }

    /// 映射 + 校验（不落库,使用新的批次重复键集合）
    pub fn validate_sheet(&self, sheet: &RawSheet) -> (MappingResult, Vec<ValidationOutcome>) {
        let mapping = self.map_headers(&sheet.headers);
        if !mapping.has_all_required_fields {
            return (mapping, Vec::new());
        }

        let mut keys = BatchKeySet::new();
        let outcomes = self
            .row_validator
            .validate_rows(&sheet.rows, &mapping.lookup(), &mut keys);
        (mapping, outcomes)
    }

    /// 分块校验同一批次
    ///
    /// # 参数
    /// - rows: 整批原始行
    /// - lookup: 字段查找表
    /// - chunk_size: 每块行数
    ///
    /// # 返回
    /// - Ok(Vec<ValidationOutcome>): 按行号排列,行号跨块连续
    /// - Err(InvalidArgument): chunk_size 为 0
    ///
    /// # 说明
    /// - 各块在阻塞线程池上执行,不占用异步运行时线程
    /// - 块按行号顺序逐个执行并共享同一个重复键集合,
    ///   同一身份键的两行总是后出现的一行被判为重复（与不分块时一致）
    pub async fn validate_in_chunks(
        &self,
        rows: Vec<RawRow>,
        lookup: &ColumnLookup,
        chunk_size: usize,
    ) -> ImportResult<Vec<ValidationOutcome>> {
        if chunk_size == 0 {
            return Err(ImportError::InvalidArgument {
                name: "chunk_size".to_string(),
                message: "块大小必须大于 0".to_string(),
            });
        }

        let keys = SharedBatchKeySet::new();
        let lookup = Arc::new(lookup.clone());
        let chunk_count = rows.len().div_ceil(chunk_size);
        debug!(chunks = chunk_count, chunk_size, "分块校验开始");

        let mut outcomes = Vec::with_capacity(rows.len());
        for (chunk_idx, chunk) in rows.chunks(chunk_size).enumerate() {
            let chunk = chunk.to_vec();
            let validator = self.row_validator.clone();
            let lookup = Arc::clone(&lookup);
            let mut keys = keys.clone();
            let first_row_number = chunk_idx * chunk_size + 1;

            let chunk_outcomes = tokio::task::spawn_blocking(move || {
                validator.validate_rows_from(&chunk, &lookup, &mut keys, first_row_number)
            })
            .await?;
            outcomes.extend(chunk_outcomes);
        }

        debug!(rows = outcomes.len(), keys = keys.len(), "分块校验完成");
        Ok(outcomes)
    }

    /// 导入一个已读取的表格
    ///
    /// # 返回
    /// - Ok(ImportReport): 映射 / 校验结果 / 汇总 / 落库数量
    /// - Err: 数据仓储失败、构件展开参数错误
    #[instrument(skip(self, sheet), fields(file = ?file_name))]
    pub async fn import_sheet(
        &self,
        sheet: RawSheet,
        file_name: Option<String>,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, rows = sheet.rows.len(), "开始导入材料清单");

        // === 步骤 1: 表头映射 ===
        let mapping = self.map_headers(&sheet.headers);
        if !mapping.has_all_required_fields {
            let missing: Vec<&str> = mapping
                .missing_required_fields
                .iter()
                .map(|f| f.literal())
                .collect();
            warn!(batch_id = %batch_id, missing = ?missing, "缺少必填列,批次未导入");
            return Ok(ImportReport {
                batch_id,
                file_name,
                started_at,
                finished_at: Utc::now(),
                mapping,
                outcomes: Vec::new(),
                summary: ValidationSummary::default(),
                imported: false,
                components_created: 0,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            });
        }

        // === 步骤 2: 行校验 ===
        let lookup = mapping.lookup();
        let chunk_size = self.config.chunk_size();
        let outcomes = if sheet.rows.len() > chunk_size {
            self.validate_in_chunks(sheet.rows, &lookup, chunk_size).await?
        } else {
            let mut keys = BatchKeySet::new();
            self.row_validator
                .validate_rows(&sheet.rows, &lookup, &mut keys)
        };

        let summary = ValidationSummary::from_outcomes(&outcomes);
        info!(
            total = summary.total_rows,
            valid = summary.valid_count,
            skipped = summary.skipped_count,
            error = summary.error_count,
            "行校验完成"
        );

        if !summary.can_import && !self.config.allow_errors() {
            warn!(batch_id = %batch_id, errors = summary.error_count, "存在错误行,批次未导入");
            return Ok(ImportReport {
                batch_id,
                file_name,
                started_at,
                finished_at: Utc::now(),
                mapping,
                outcomes,
                summary,
                imported: false,
                components_created: 0,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            });
        }

        // === 步骤 3: 合并线性管段 + 展开 + 权重 ===
        let rows: Vec<NormalizedRow> = outcomes
            .iter()
            .filter_map(|o| o.normalized.clone())
            .collect();
        let rows = merge_linear_runs(rows);

        let mut drawing_ids: HashMap<String, String> = HashMap::new();
        let mut weighted = Vec::new();
        for row in &rows {
            let drawing_id = match drawing_ids.get(&row.drawing) {
                Some(id) => id.clone(),
                None => {
                    let id = self.repo.resolve_drawing(&row.drawing).await?;
                    drawing_ids.insert(row.drawing.clone(), id.clone());
                    id
                }
            };

            for component in explode_quantity(row, &drawing_id)? {
                let weight = self.weigh(&component.identity, row.component_type, &component.attributes);
                weighted.push(WeightedComponent { component, weight });
            }
        }
        debug!(components = weighted.len(), drawings = drawing_ids.len(), "构件展开完成");

        // === 步骤 4: 落库 ===
        let components_created = self.repo.insert_components(weighted).await?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            components = components_created,
            elapsed_ms,
            "材料清单导入完成"
        );

        Ok(ImportReport {
            batch_id,
            file_name,
            started_at,
            finished_at: Utc::now(),
            mapping,
            outcomes,
            summary,
            imported: true,
            components_created,
            elapsed_ms,
        })
    }

    /// 从文件导入
    pub async fn import_file<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        let sheet = self.file_parser.parse_sheet(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "文件解析失败");
            e
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());
        self.import_sheet(sheet, file_name).await
    }

    /// 批量导入多个文件（并发执行,每个文件独立批次）
    ///
    /// 某个文件失败不影响其他文件。
    pub async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportReport>> {
        info!(count = file_paths.len(), "开始批量导入文件");

        let import_tasks = file_paths.iter().map(|path| async move {
            let path_str = path.as_ref().display().to_string();
            let result = self.import_file(path).await;
            match &result {
                Ok(report) => info!(
                    file = %path_str,
                    imported = report.imported,
                    components = report.components_created,
                    "文件导入结束"
                ),
                Err(e) => error!(file = %path_str, error = %e, "文件导入失败"),
            }
            result
        });

        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }

    fn weigh(
        &self,
        identity: &ComponentIdentity,
        component_type: ComponentType,
        attributes: &ComponentAttributes,
    ) -> WeightResult {
        let total_linear_feet = match identity {
            ComponentIdentity::Aggregate {
                total_linear_feet, ..
            } => *total_linear_feet,
            _ => None,
        };
        let aux = attributes.to_aux_attributes(total_linear_feet);
        self.weight_calculator
            .calculate(identity, component_type.as_str(), Some(&aux))
    }
}

/// 合并同一身份的 Threaded_Pipe 行（数量为长度,求和）
///
/// 其他行原样保留,输出顺序为各组首次出现的顺序。
pub fn merge_linear_runs(rows: Vec<NormalizedRow>) -> Vec<NormalizedRow> {
    let mut merged: Vec<NormalizedRow> = Vec::with_capacity(rows.len());
    let mut run_index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if row.component_type != ComponentType::ThreadedPipe {
            merged.push(row);
            continue;
        }

        let pipe_id = aggregate_pipe_id(&row.drawing, &row.size, &row.commodity_code);
        match run_index.get(&pipe_id) {
            Some(&idx) => {
                merged[idx].qty += row.qty;
                debug!(pipe_id = %pipe_id, total = merged[idx].qty, "合并螺纹管长度");
            }
            None => {
                run_index.insert(pipe_id, merged.len());
                merged.push(row);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn normalized(component_type: ComponentType, qty: f64, cmdty: &str) -> NormalizedRow {
        NormalizedRow {
            drawing: "P-001".to_string(),
            component_type,
            raw_type: component_type.as_str().to_string(),
            qty,
            commodity_code: cmdty.to_string(),
            size: "1".to_string(),
            raw_size: Some("1".to_string()),
            spec: None,
            description: None,
            comments: None,
            area: None,
            system: None,
            test_package: None,
            identity_key: format!("P-001-1-{}-001", cmdty),
            unmapped_fields: BTreeMap::new(),
        }
    }

    #[test]
    fn test_merge_linear_runs_sums_threaded_pipe() {
        let rows = vec![
            normalized(ComponentType::ThreadedPipe, 10.0, "TP1"),
            normalized(ComponentType::Valve, 2.0, "VB1"),
            normalized(ComponentType::ThreadedPipe, 2.5, "TP1"),
            normalized(ComponentType::ThreadedPipe, 4.0, "TP2"),
        ];

        let merged = merge_linear_runs(rows);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].commodity_code, "TP1");
        assert_eq!(merged[0].qty, 12.5);
        assert_eq!(merged[1].component_type, ComponentType::Valve);
        assert_eq!(merged[2].qty, 4.0);
    }

    #[test]
    fn test_merge_linear_runs_keeps_other_types() {
        let rows = vec![
            normalized(ComponentType::Pipe, 3.0, "P1"),
            normalized(ComponentType::Pipe, 3.0, "P1"),
        ];
        assert_eq!(merge_linear_runs(rows).len(), 2);
    }
}
