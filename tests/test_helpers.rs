// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、参考数据准备、CSV 文件生成
// ==========================================

#![allow(dead_code)]

use packaging_unit_import::db::{init_schema, open_sqlite_connection};
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 包装单元导入 CSV 表头
pub const UNIT_HEADER: &str =
    "CONCRETE_SKU,LEAD_PRODUCT_SKU,TYPE_NAME,IS_AMOUNT_VARIABLE,DEFAULT_AMOUNT,AMOUNT_MIN,AMOUNT_MAX,AMOUNT_INTERVAL";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = open_sqlite_connection(db_path).expect("打开测试数据库失败");
    Arc::new(Mutex::new(conn))
}

/// 插入参考数据
///
/// - 产品 SKU-1 ~ SKU-{count}（均有销售计量单位）
/// - SKU-NOUNIT（无销售计量单位）
/// - SKU-LEAD（主产品）
/// - 包装单元类型 box / pallet
pub fn seed_reference_data(db_path: &str, count: usize) -> Result<(), Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    conn.execute_batch("BEGIN")?;
    for i in 1..=count {
        conn.execute(
            "INSERT INTO product (id_product, sku) VALUES (?1, ?2)",
            rusqlite::params![i as i64, format!("SKU-{}", i)],
        )?;
        conn.execute(
            "INSERT INTO product_measurement_sales_unit (fk_product) VALUES (?1)",
            [i as i64],
        )?;
    }
    conn.execute_batch(
        r#"
        INSERT INTO product (sku) VALUES ('SKU-NOUNIT');
        INSERT INTO product (sku) VALUES ('SKU-LEAD');
        INSERT INTO product_packaging_unit_type (name) VALUES ('box'), ('pallet');
        COMMIT;
        "#,
    )?;
    Ok(())
}

/// 产品 ID
pub fn product_id(db_path: &str, sku: &str) -> i64 {
    let conn = open_sqlite_connection(db_path).unwrap();
    conn.query_row("SELECT id_product FROM product WHERE sku = ?1", [sku], |r| r.get(0))
        .unwrap()
}

/// 表行数
pub fn count_rows(db_path: &str, table: &str) -> i64 {
    let conn = open_sqlite_connection(db_path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

/// 包装单元 CSV 行
pub fn unit_line(sku: &str, type_name: &str, variable: &str, min: &str, max: &str, interval: &str) -> String {
    format!("{},SKU-LEAD,{},{},1,{},{},{}", sku, type_name, variable, min, max, interval)
}

/// 在目录下写入 CSV 文件
pub fn write_csv(dir: &Path, name: &str, header: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", header).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path
}
