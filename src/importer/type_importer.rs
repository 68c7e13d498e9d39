// ==========================================
// 包装单元导入 - 包装单元类型导入器
// ==========================================
// 职责: NAME 列 → product_packaging_unit_type（按名称查找，不存在则创建）
// 幂等: 重复导入同名类型不产生新记录
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{ImportKind, ImportSummary, RawRow, WriteOutcome};
use crate::events::NoOpEventPublisher;
use crate::importer::bulk_runner::{BulkRunner, ImportOptions};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::CsvRowSource;
use crate::repository::{
    ImportBatchRepository, PackagingUnitTypeRepository, PackagingUnitTypeRepositoryImpl,
    SqliteUnitOfWork,
};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

pub struct PackagingUnitTypeImporter {
    conn: Arc<Mutex<Connection>>,
    options: ImportOptions,
    config_snapshot: Option<String>,
}

impl PackagingUnitTypeImporter {
    pub fn new(conn: Arc<Mutex<Connection>>, options: ImportOptions) -> Self {
        Self {
            conn,
            options,
            config_snapshot: None,
        }
    }

    pub fn from_config<C: ImportConfigReader + ?Sized>(
        conn: Arc<Mutex<Connection>>,
        config: &C,
    ) -> ImportResult<Self> {
        Ok(Self::new(conn, ImportOptions::from_config(config)?))
    }

    pub fn with_config_snapshot(mut self, snapshot: String) -> Self {
        self.config_snapshot = Some(snapshot);
        self
    }

    pub fn import_file<F: AsRef<Path>>(&self, file_path: F) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();
        let source = CsvRowSource::open(path)?;
        self.import_rows(source, Some(&path.display().to_string()))
    }

    #[instrument(skip(self, rows), fields(batch_id))]
    pub fn import_rows<I>(&self, rows: I, file_path: Option<&str>) -> ImportResult<ImportSummary>
    where
        I: IntoIterator<Item = ImportResult<RawRow>>,
    {
        let uow = SqliteUnitOfWork::from_connection(self.conn.clone());
        let batch_repo = ImportBatchRepository::from_connection(self.conn.clone());
        // 类型变更不触发下游发布
        let publisher = NoOpEventPublisher;
        let runner = BulkRunner::new(
            &uow,
            &publisher,
            &batch_repo,
            self.options,
            ImportKind::PackagingUnitType,
        );
        tracing::Span::current().record("batch_id", runner.batch_id());
        info!(batch_id = %runner.batch_id(), file_path = file_path.unwrap_or("-"), "开始导入包装单元类型");

        let repo = PackagingUnitTypeRepositoryImpl::from_connection(self.conn.clone());
        let mapper = FieldMapper::new();

        let tally = runner.run(rows, |raw, _events| {
            let row = mapper.map_packaging_unit_type(raw)?;
            match repo.find_id_by_name(&row.name)? {
                Some(id) => {
                    debug!(name = %row.name, id, "包装单元类型已存在");
                    Ok(WriteOutcome::Updated)
                }
                None => {
                    let id = repo.create(&row.name)?;
                    debug!(name = %row.name, id, "包装单元类型已创建");
                    Ok(WriteOutcome::Created)
                }
            }
        })?;

        let batch = runner.finish(&tally, file_path, self.config_snapshot.clone())?;
        info!(
            batch_id = %batch.batch_id,
            status = batch.status.as_str(),
            created = tally.created,
            existing = tally.updated,
            failed = batch.failed_rows,
            "包装单元类型导入完成"
        );

        Ok(ImportSummary {
            batch,
            created: tally.created,
            updated: tally.updated,
            failures: tally.failure_sample,
            cache_stats: None,
            elapsed_time: runner.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::{columns, BatchStatus};

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn name_row(n: usize, name: &str) -> ImportResult<RawRow> {
        Ok(RawRow::new(n).with_field(columns::NAME, name))
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let conn = setup();
        let importer = PackagingUnitTypeImporter::new(conn.clone(), ImportOptions::default());

        let first = importer
            .import_rows(vec![name_row(1, "box"), name_row(2, "pallet")], None)
            .unwrap();
        assert_eq!(first.created, 2);

        let second = importer
            .import_rows(vec![name_row(1, "box"), name_row(2, "crate")], None)
            .unwrap();
        assert_eq!(second.created, 1);
        assert_eq!(second.updated, 1);
        assert_eq!(second.batch.status, BatchStatus::Completed);

        let repo = PackagingUnitTypeRepositoryImpl::from_connection(conn);
        assert!(repo.find_id_by_name("crate").unwrap().is_some());
    }

    #[test]
    fn test_blank_name_fails_row() {
        let importer = PackagingUnitTypeImporter::new(setup(), ImportOptions::default());

        let summary = importer.import_rows(vec![name_row(1, "")], None).unwrap();

        assert!(summary.is_aborted());
        assert_eq!(summary.failures[0].error_kind, "INVALID_VALUE");
        assert!(summary.cache_stats.is_none());
    }
}
