// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的内存数据仓储、表格构造、临时文件等功能
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;
use takeoff_import::domain::{RawRow, RawSheet, WeightedComponent};
use takeoff_import::importer::{ComponentRepository, ImportError, ImportResult};
use tempfile::NamedTempFile;

/// 标准表头（带必填标记）
pub const STANDARD_HEADERS: [&str; 6] = ["DRAWING*", "TYPE*", "QTY*", "CMDTY CODE*", "SIZE", "SPEC"];

// ==========================================
// InMemoryRepository - 内存数据仓储
// ==========================================
#[derive(Default)]
pub struct InMemoryRepository {
    drawings: Mutex<HashMap<String, String>>,
    components: Mutex<Vec<WeightedComponent>>,
    fail_inserts: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入时总是失败的仓储
    pub fn failing() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    pub fn components(&self) -> Vec<WeightedComponent> {
        self.components.lock().unwrap().clone()
    }

    pub fn drawing_count(&self) -> usize {
        self.drawings.lock().unwrap().len()
    }
}

#[async_trait]
impl ComponentRepository for InMemoryRepository {
    async fn resolve_drawing(&self, drawing_norm: &str) -> ImportResult<String> {
        let mut drawings = self.drawings.lock().unwrap();
        let next_id = format!("dwg-{}", drawings.len() + 1);
        Ok(drawings
            .entry(drawing_norm.to_string())
            .or_insert(next_id)
            .clone())
    }

    async fn insert_components(&self, components: Vec<WeightedComponent>) -> ImportResult<usize> {
        if self.fail_inserts {
            return Err(ImportError::RepositoryError("insert rejected".to_string()));
        }
        let count = components.len();
        self.components.lock().unwrap().extend(components);
        Ok(count)
    }
}

// ==========================================
// 表格构造
// ==========================================

/// 按标准表头构造一行: [drawing, type, qty, cmdty, size, spec]
pub fn standard_row(values: [&str; 6]) -> RawRow {
    STANDARD_HEADERS
        .iter()
        .zip(values.iter())
        .map(|(h, v)| (h.to_string(), v.to_string()))
        .collect()
}

/// 使用标准表头构造表格
pub fn standard_sheet(rows: &[[&str; 6]]) -> RawSheet {
    RawSheet {
        headers: STANDARD_HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: rows.iter().map(|r| standard_row(*r)).collect(),
    }
}

/// 写入临时 CSV 文件
pub fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp csv");
    for line in lines {
        writeln!(temp_file, "{}", line).expect("Failed to write csv line");
    }
    temp_file
}
