// ==========================================
// 包装单元导入 - 包装单元 Repository 实现
// ==========================================
// 职责: 实现包装单元及类型数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 存储: 小数以 TEXT 保存，避免精度丢失
// ==========================================

use crate::domain::PackagingUnitRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::lock_connection;
use crate::repository::packaging_unit_repo::{
    PackagingUnitRepository, PackagingUnitTypeRepository,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;

fn parse_decimal(field: &str, raw: &str) -> RepositoryResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("{} ({})", e, raw),
    })
}

fn parse_optional_decimal(field: &str, raw: Option<String>) -> RepositoryResult<Option<Decimal>> {
    raw.map(|v| parse_decimal(field, &v)).transpose()
}

fn parse_timestamp(field: &str, raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: e.to_string(),
        })
}

// 数据库原始行（小数/时间仍为 TEXT）
struct PackagingUnitRow {
    id: i64,
    product_id: i64,
    lead_product_id: i64,
    packaging_unit_type_id: i64,
    is_amount_variable: bool,
    default_amount: String,
    amount_min: Option<String>,
    amount_max: Option<String>,
    amount_interval: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PackagingUnitRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            product_id: row.get(1)?,
            lead_product_id: row.get(2)?,
            packaging_unit_type_id: row.get(3)?,
            is_amount_variable: row.get(4)?,
            default_amount: row.get(5)?,
            amount_min: row.get(6)?,
            amount_max: row.get(7)?,
            amount_interval: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_record(self) -> RepositoryResult<PackagingUnitRecord> {
        Ok(PackagingUnitRecord {
            id: Some(self.id),
            product_id: self.product_id,
            lead_product_id: self.lead_product_id,
            packaging_unit_type_id: self.packaging_unit_type_id,
            is_amount_variable: self.is_amount_variable,
            default_amount: parse_decimal("default_amount", &self.default_amount)?,
            amount_min: parse_optional_decimal("amount_min", self.amount_min)?,
            amount_max: parse_optional_decimal("amount_max", self.amount_max)?,
            amount_interval: parse_optional_decimal("amount_interval", self.amount_interval)?,
            created_at: Some(parse_timestamp("created_at", &self.created_at)?),
            updated_at: Some(parse_timestamp("updated_at", &self.updated_at)?),
        })
    }
}

// ==========================================
// PackagingUnitRepositoryImpl
// ==========================================
pub struct PackagingUnitRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl PackagingUnitRepositoryImpl {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl PackagingUnitRepository for PackagingUnitRepositoryImpl {
    fn find_by_product_id(&self, product_id: i64) -> RepositoryResult<Option<PackagingUnitRecord>> {
        let conn = lock_connection(&self.conn)?;
        let row = conn
            .query_row(
                r#"
                SELECT id_product_packaging_unit, fk_product, fk_lead_product,
                       fk_product_packaging_unit_type, is_amount_variable, default_amount,
                       amount_min, amount_max, amount_interval, created_at, updated_at
                FROM product_packaging_unit
                WHERE fk_product = ?1
                "#,
                params![product_id],
                PackagingUnitRow::from_row,
            )
            .optional()?;

        row.map(PackagingUnitRow::into_record).transpose()
    }

    fn save(&self, record: &mut PackagingUnitRecord) -> RepositoryResult<()> {
        let conn = lock_connection(&self.conn)?;
        let now = Utc::now();

        match record.id {
            None => {
                conn.execute(
                    r#"
                    INSERT INTO product_packaging_unit (
                        fk_product, fk_lead_product, fk_product_packaging_unit_type,
                        is_amount_variable, default_amount, amount_min, amount_max,
                        amount_interval, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    "#,
                    params![
                        record.product_id,
                        record.lead_product_id,
                        record.packaging_unit_type_id,
                        record.is_amount_variable,
                        record.default_amount.to_string(),
                        record.amount_min.map(|d| d.to_string()),
                        record.amount_max.map(|d| d.to_string()),
                        record.amount_interval.map(|d| d.to_string()),
                        now.to_rfc3339(),
                        now.to_rfc3339(),
                    ],
                )?;
                record.id = Some(conn.last_insert_rowid());
                record.created_at = Some(now);
                debug!(id = ?record.id, product_id = record.product_id, "包装单元已插入");
            }
            Some(id) => {
                let affected = conn.execute(
                    r#"
                    UPDATE product_packaging_unit SET
                        fk_product = ?2, fk_lead_product = ?3, fk_product_packaging_unit_type = ?4,
                        is_amount_variable = ?5, default_amount = ?6, amount_min = ?7,
                        amount_max = ?8, amount_interval = ?9, updated_at = ?10
                    WHERE id_product_packaging_unit = ?1
                    "#,
                    params![
                        id,
                        record.product_id,
                        record.lead_product_id,
                        record.packaging_unit_type_id,
                        record.is_amount_variable,
                        record.default_amount.to_string(),
                        record.amount_min.map(|d| d.to_string()),
                        record.amount_max.map(|d| d.to_string()),
                        record.amount_interval.map(|d| d.to_string()),
                        now.to_rfc3339(),
                    ],
                )?;
                if affected == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "product_packaging_unit".to_string(),
                        id: id.to_string(),
                    });
                }
                debug!(id, product_id = record.product_id, "包装单元已更新");
            }
        }

        record.updated_at = Some(now);
        Ok(())
    }

    fn count(&self) -> RepositoryResult<usize> {
        let conn = lock_connection(&self.conn)?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM product_packaging_unit", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

// ==========================================
// PackagingUnitTypeRepositoryImpl
// ==========================================
pub struct PackagingUnitTypeRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl PackagingUnitTypeRepositoryImpl {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl PackagingUnitTypeRepository for PackagingUnitTypeRepositoryImpl {
    fn find_id_by_name(&self, name: &str) -> RepositoryResult<Option<i64>> {
        let conn = lock_connection(&self.conn)?;
        let id = conn
            .query_row(
                "SELECT id_product_packaging_unit_type FROM product_packaging_unit_type WHERE name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }

    fn create(&self, name: &str) -> RepositoryResult<i64> {
        let conn = lock_connection(&self.conn)?;
        conn.execute(
            "INSERT INTO product_packaging_unit_type (name) VALUES (?1)",
            params![name],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
