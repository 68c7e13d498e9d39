// ==========================================
// 包装单元导入 - 命令行入口
// ==========================================
// 用法: packaging-unit-import <types|units> <file.csv>... [--db <path>]
// 数据库路径: --db > 环境变量 PACKAGING_UNIT_IMPORT_DB_PATH > 用户数据目录
// ==========================================

use anyhow::{bail, Context};
use packaging_unit_import::api::{ImportApi, ImportApiResponse};
use packaging_unit_import::domain::{BatchStatus, ImportKind};
use packaging_unit_import::logging;
use std::path::PathBuf;

const DB_PATH_ENV: &str = "PACKAGING_UNIT_IMPORT_DB_PATH";

const USAGE: &str = "用法: packaging-unit-import <types|units> <file.csv>... [--db <path>]";

struct CliArgs {
    kind: ImportKind,
    files: Vec<String>,
    db_path: Option<String>,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> anyhow::Result<CliArgs> {
    let kind = match args.next().as_deref() {
        Some("types") => ImportKind::PackagingUnitType,
        Some("units") => ImportKind::PackagingUnit,
        Some(other) => bail!("未知的导入类型: {}\n{}", other, USAGE),
        None => bail!("{}", USAGE),
    };

    let mut files = Vec::new();
    let mut db_path = None;
    while let Some(arg) = args.next() {
        if arg == "--db" {
            db_path = Some(args.next().context("--db 缺少路径参数")?);
        } else {
            files.push(arg);
        }
    }

    if files.is_empty() {
        bail!("至少需要一个 CSV 文件\n{}", USAGE);
    }

    Ok(CliArgs {
        kind,
        files,
        db_path,
    })
}

/// 默认数据库路径
fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./packaging_unit_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("packaging-unit-import");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("packaging_unit_import.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn print_response(file: &str, response: &ImportApiResponse) {
    println!(
        "{}: batch={} status={} total={} success={} failed={} created={} updated={} elapsed={}ms",
        file,
        response.batch_id,
        response.status.as_str(),
        response.total_rows,
        response.success_rows,
        response.failed_rows,
        response.created,
        response.updated,
        response.elapsed_ms,
    );
    for failure in &response.failures {
        println!(
            "  行 {} [{}] {}",
            failure.row_number, failure.error_kind, failure.message
        );
    }
    let omitted = response.failed_rows - response.failures.len() as i64;
    if omitted > 0 {
        println!("  ... 另有 {} 条失败行，见批次失败明细", omitted);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = parse_args(std::env::args().skip(1))?;
    let db_path = args.db_path.clone().unwrap_or_else(default_db_path);

    tracing::info!(
        version = packaging_unit_import::VERSION,
        db_path = %db_path,
        kind = args.kind.as_str(),
        files = args.files.len(),
        "包装单元导入启动"
    );

    let api = ImportApi::new(&db_path).context("初始化数据库失败")?;
    let results = api.batch_import(args.kind, args.files.clone()).await;

    let mut failed = false;
    for (file, result) in args.files.iter().zip(results) {
        match result {
            Ok(response) => {
                if response.status != BatchStatus::Completed {
                    failed = true;
                }
                print_response(file, &response);
            }
            Err(e) => {
                failed = true;
                eprintln!("{}: 导入失败: {}", file, e);
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(args(&["units", "a.csv", "--db", "x.db", "b.csv"])).unwrap();
        assert_eq!(parsed.kind, ImportKind::PackagingUnit);
        assert_eq!(parsed.files, vec!["a.csv", "b.csv"]);
        assert_eq!(parsed.db_path.as_deref(), Some("x.db"));
    }

    #[test]
    fn test_parse_args_rejects_bad_input() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["products", "a.csv"])).is_err());
        assert!(parse_args(args(&["types"])).is_err());
        assert!(parse_args(args(&["types", "a.csv", "--db"])).is_err());
    }
}
