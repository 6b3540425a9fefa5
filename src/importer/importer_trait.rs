// ==========================================
// 施工进度跟踪系统 - 导入接口
// ==========================================
// 职责: 定义导入管道的外部接缝（不包含实现）
// - FileParser:          表格文件 → RawSheet
// - ComponentRepository: 外部数据仓储（图纸解析 + 构件落库）
// ==========================================

use crate::domain::takeoff::{RawSheet, WeightedComponent};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表头 + 原始行
    ///
    /// # 返回
    /// - Ok(RawSheet): 表头保持原始顺序,完全空白的行已剔除
    /// - Err: 文件不存在、格式不支持、解析失败
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet>;
}

// ==========================================
// ComponentRepository Trait
// ==========================================
// 用途: 持久化由外部协作方负责,本 crate 只交付已校验构件
#[async_trait]
pub trait ComponentRepository: Send + Sync {
    /// 解析图纸标识（不存在时由仓储自行创建）
    ///
    /// # 参数
    /// - drawing_norm: 标准化图号
    async fn resolve_drawing(&self, drawing_norm: &str) -> ImportResult<String>;

    /// 写入构件
    ///
    /// # 返回
    /// - Ok(usize): 实际写入数量
    async fn insert_components(&self, components: Vec<WeightedComponent>) -> ImportResult<usize>;
}
