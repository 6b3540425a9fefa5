// ==========================================
// 施工进度跟踪系统 - 材料清单预检命令行
// ==========================================
// 用法:
//   takeoff-import <file> [config.json]
//
// 读取表格 → 表头映射 → 行校验,以 JSON 输出映射与汇总（不落库）
// 退出码: 0 可导入 / 1 存在错误行或缺少必填列 / 2 用法错误
// ==========================================

use anyhow::Context;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;
use takeoff_import::config::{ConfigManager, ImportConfigReader};
use takeoff_import::domain::ValidationSummary;
use takeoff_import::i18n;
use takeoff_import::importer::{
    BatchKeySet, ColumnMapper, FileParser, RowValidator, UniversalFileParser,
};
use takeoff_import::{logging, APP_NAME, VERSION};

fn main() -> ExitCode {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next() else {
        eprintln!("用法: {} <file> [config.json]", APP_NAME);
        return ExitCode::from(2);
    };
    let config_path = args.next();

    match run(&file_path, config_path.as_deref()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

/// 预检一个文件,返回是否可导入
fn run(file_path: &str, config_path: Option<&str>) -> anyhow::Result<bool> {
    let manager = match config_path {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::new(),
    }
    .context("加载配置失败")?;
    let locale = manager.locale();

    tracing::info!(version = VERSION, file = %file_path, "开始预检材料清单");

    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!(i18n::t_in(&locale, "import.file_not_found", &[("path", file_path)]));
    }

    let sheet = UniversalFileParser
        .parse_sheet(path)
        .with_context(|| format!("读取文件失败: {}", file_path))?;

    let mapper = ColumnMapper::with_extra_synonyms(&manager.extra_synonyms());
    let mapping = mapper.map_columns(&sheet.headers);

    if !mapping.has_all_required_fields {
        let fields = mapping
            .missing_required_fields
            .iter()
            .map(|f| f.literal())
            .collect::<Vec<_>>()
            .join(", ");
        eprintln!("{}", i18n::t_in(&locale, "import.missing_columns", &[("fields", &fields)]));
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "file": file_path, "mapping": mapping }))?
        );
        return Ok(false);
    }

    let validator = RowValidator::new(&locale);
    let mut keys = BatchKeySet::new();
    let outcomes = validator.validate_rows(&sheet.rows, &mapping.lookup(), &mut keys);
    let summary = ValidationSummary::from_outcomes(&outcomes);
    let issues: Vec<_> = outcomes.iter().filter(|o| !o.is_valid()).collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "file": file_path,
            "mapping": mapping,
            "summary": summary,
            "issues": issues,
        }))?
    );

    Ok(summary.can_import)
}
