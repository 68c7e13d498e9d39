// ==========================================
// 包装单元导入 - 导入批次 Repository
// ==========================================
// 职责: import_batch / import_row_failure 表读写
// ==========================================

use crate::domain::{BatchStatus, ImportBatch, ImportKind, RowFailure};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::lock_connection;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

fn parse_kind(raw: &str) -> ImportKind {
    match raw.trim() {
        "PACKAGING_UNIT_TYPE" => ImportKind::PackagingUnitType,
        _ => ImportKind::PackagingUnit,
    }
}

fn parse_timestamp(field: &str, raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: e.to_string(),
        })
}

pub struct ImportBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportBatchRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 插入批次记录
    pub fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = lock_connection(&self.conn)?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, import_kind, file_path, total_rows, success_rows, failed_rows,
                status, started_at, completed_at, elapsed_ms, config_snapshot
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.import_kind.as_str(),
                batch.file_path,
                batch.total_rows,
                batch.success_rows,
                batch.failed_rows,
                batch.status.as_str(),
                batch.started_at.to_rfc3339(),
                batch.completed_at.to_rfc3339(),
                batch.elapsed_ms,
                batch.config_snapshot,
            ],
        )?;
        Ok(())
    }

    /// 插入失败行记录
    pub fn insert_failure(&self, failure: &RowFailure) -> RepositoryResult<()> {
        let conn = lock_connection(&self.conn)?;
        conn.execute(
            r#"
            INSERT INTO import_row_failure (
                failure_id, batch_id, row_number, error_kind, message, raw_data, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                failure.failure_id,
                failure.batch_id,
                failure.row_number as i64,
                failure.error_kind,
                failure.message,
                failure.raw_data,
                failure.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询批次
    pub fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = lock_connection(&self.conn)?;
        let raw = conn
            .query_row(
                r#"
                SELECT batch_id, import_kind, file_path, total_rows, success_rows, failed_rows,
                       status, started_at, completed_at, elapsed_ms, config_snapshot
                FROM import_batch WHERE batch_id = ?1
                "#,
                params![batch_id],
                RawBatch::from_row,
            )
            .optional()?;
        raw.map(RawBatch::into_batch).transpose()
    }

    /// 查询最近的批次
    pub fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = lock_connection(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, import_kind, file_path, total_rows, success_rows, failed_rows,
                   status, started_at, completed_at, elapsed_ms, config_snapshot
            FROM import_batch ORDER BY started_at DESC LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![limit as i64], RawBatch::from_row)?;

        let mut batches = Vec::new();
        for row in rows {
            batches.push(row?.into_batch()?);
        }
        Ok(batches)
    }

    /// 查询批次的失败行（按行号排序）
    pub fn list_failures_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<RowFailure>> {
        let conn = lock_connection(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT failure_id, batch_id, row_number, error_kind, message, raw_data, created_at
            FROM import_row_failure WHERE batch_id = ?1 ORDER BY row_number
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut failures = Vec::new();
        for row in rows {
            let (failure_id, batch_id, row_number, error_kind, message, raw_data, created_at) = row?;
            failures.push(RowFailure {
                failure_id,
                batch_id,
                row_number: row_number as usize,
                error_kind,
                message,
                raw_data,
                created_at: parse_timestamp("created_at", &created_at)?,
            });
        }
        Ok(failures)
    }
}

struct RawBatch {
    batch_id: String,
    import_kind: String,
    file_path: Option<String>,
    total_rows: i64,
    success_rows: i64,
    failed_rows: i64,
    status: String,
    started_at: String,
    completed_at: String,
    elapsed_ms: i64,
    config_snapshot: Option<String>,
}

impl RawBatch {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            batch_id: row.get(0)?,
            import_kind: row.get(1)?,
            file_path: row.get(2)?,
            total_rows: row.get(3)?,
            success_rows: row.get(4)?,
            failed_rows: row.get(5)?,
            status: row.get(6)?,
            started_at: row.get(7)?,
            completed_at: row.get(8)?,
            elapsed_ms: row.get(9)?,
            config_snapshot: row.get(10)?,
        })
    }

    fn into_batch(self) -> RepositoryResult<ImportBatch> {
        Ok(ImportBatch {
            batch_id: self.batch_id,
            import_kind: parse_kind(&self.import_kind),
            file_path: self.file_path,
            total_rows: self.total_rows,
            success_rows: self.success_rows,
            failed_rows: self.failed_rows,
            status: BatchStatus::parse(&self.status),
            started_at: parse_timestamp("started_at", &self.started_at)?,
            completed_at: parse_timestamp("completed_at", &self.completed_at)?,
            elapsed_ms: self.elapsed_ms,
            config_snapshot: self.config_snapshot,
        })
    }
}
