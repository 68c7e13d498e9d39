// ==========================================
// 包装单元导入 - 包装单元导入器
// ==========================================
// 职责: 整合导入流程，从 CSV 到 product_packaging_unit
// 流程: 读取 → 映射 → 校验销售计量单位 → 规范化 → 解析引用 → 落库 → 提交后发布事件
// 生命周期: 每次运行新建引用解析器（三个缓存不跨运行共享）
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{ImportKind, ImportSummary, RawRow};
use crate::events::EventPublisher;
use crate::importer::bulk_runner::{BulkRunner, ImportOptions};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::CsvRowSource;
use crate::importer::reference_resolver::ReferenceResolver;
use crate::importer::row_writer::PackagingUnitWriter;
use crate::repository::{
    ImportBatchRepository, PackagingUnitRepositoryImpl, ReferenceRepositoryImpl, SqliteUnitOfWork,
};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

// ==========================================
// PackagingUnitImporter - 包装单元导入器
// ==========================================
pub struct PackagingUnitImporter<P>
where
    P: EventPublisher,
{
    conn: Arc<Mutex<Connection>>,
    options: ImportOptions,
    publisher: P,
    config_snapshot: Option<String>,
}

impl<P> PackagingUnitImporter<P>
where
    P: EventPublisher,
{
    /// # 参数
    /// - conn: 共享连接（仓储与事务共用）
    /// - options: 缓存容量 / 事务粒度 / 失败策略
    /// - publisher: 提交后接收发布事件
    pub fn new(conn: Arc<Mutex<Connection>>, options: ImportOptions, publisher: P) -> Self {
        Self {
            conn,
            options,
            publisher,
            config_snapshot: None,
        }
    }

    /// 从配置读取导入参数
    pub fn from_config<C: ImportConfigReader + ?Sized>(
        conn: Arc<Mutex<Connection>>,
        config: &C,
        publisher: P,
    ) -> ImportResult<Self> {
        Ok(Self::new(conn, ImportOptions::from_config(config)?, publisher))
    }

    /// 附带配置快照（写入批次记录）
    pub fn with_config_snapshot(mut self, snapshot: String) -> Self {
        self.config_snapshot = Some(snapshot);
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// 从 CSV 文件导入
    pub fn import_file<F: AsRef<Path>>(&self, file_path: F) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();
        let source = CsvRowSource::open(path)?;
        self.import_rows(source, Some(&path.display().to_string()))
    }

    /// 从任意行来源导入
    #[instrument(skip(self, rows), fields(batch_id))]
    pub fn import_rows<I>(&self, rows: I, file_path: Option<&str>) -> ImportResult<ImportSummary>
    where
        I: IntoIterator<Item = ImportResult<RawRow>>,
    {
        let uow = SqliteUnitOfWork::from_connection(self.conn.clone());
        let batch_repo = ImportBatchRepository::from_connection(self.conn.clone());
        let runner = BulkRunner::new(
            &uow,
            &self.publisher,
            &batch_repo,
            self.options,
            ImportKind::PackagingUnit,
        );
        tracing::Span::current().record("batch_id", runner.batch_id());

        info!(
            batch_id = %runner.batch_id(),
            file_path = file_path.unwrap_or("-"),
            cache_capacity = self.options.cache_capacity,
            bulk_size = self.options.bulk_size,
            error_policy = self.options.error_policy.as_str(),
            "开始导入包装单元"
        );

        let resolver = ReferenceResolver::with_capacity(
            ReferenceRepositoryImpl::from_connection(self.conn.clone()),
            self.options.cache_capacity,
        );
        let mut writer = PackagingUnitWriter::new(
            resolver,
            PackagingUnitRepositoryImpl::from_connection(self.conn.clone()),
        );
        let mapper = FieldMapper::new();

        let tally = runner.run(rows, |raw, events| {
            let row = mapper.map_packaging_unit(raw)?;
            writer.write(&row, events)
        })?;

        let stats = writer.stats();
        info!(
            batch_id = %runner.batch_id(),
            type_hits = stats.packaging_unit_type.hits,
            type_misses = stats.packaging_unit_type.misses,
            type_clears = stats.packaging_unit_type.clears,
            product_hits = stats.product.hits,
            product_misses = stats.product.misses,
            product_clears = stats.product.clears,
            sales_unit_hits = stats.measurement_sales_unit.hits,
            sales_unit_misses = stats.measurement_sales_unit.misses,
            sales_unit_clears = stats.measurement_sales_unit.clears,
            "引用缓存统计"
        );

        let batch = runner.finish(&tally, file_path, self.config_snapshot.clone())?;
        info!(
            batch_id = %batch.batch_id,
            status = batch.status.as_str(),
            total = batch.total_rows,
            success = batch.success_rows,
            failed = batch.failed_rows,
            created = tally.created,
            updated = tally.updated,
            events = tally.events_published,
            elapsed_ms = batch.elapsed_ms,
            "包装单元导入完成"
        );

        Ok(ImportSummary {
            batch,
            created: tally.created,
            updated: tally.updated,
            failures: tally.failure_sample,
            cache_stats: Some(stats),
            elapsed_time: runner.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::{columns, BatchStatus, ErrorPolicy};
    use crate::events::{NoOpEventPublisher, OutboxEventPublisher};
    use crate::repository::{EventOutboxRepository, PackagingUnitRepository};

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO product (id_product, sku) VALUES (1, 'SKU-1'), (2, 'SKU-2'), (9, 'SKU-LEAD');
            INSERT INTO product_measurement_sales_unit (fk_product) VALUES (1), (9);
            INSERT INTO product_packaging_unit_type (id_product_packaging_unit_type, name)
                VALUES (10, 'box');
            "#,
        )
        .unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn unit_row(n: usize, sku: &str) -> ImportResult<RawRow> {
        Ok(RawRow::new(n)
            .with_field(columns::CONCRETE_SKU, sku)
            .with_field(columns::LEAD_PRODUCT_SKU, "SKU-LEAD")
            .with_field(columns::TYPE_NAME, "box")
            .with_field(columns::IS_AMOUNT_VARIABLE, "1")
            .with_field(columns::DEFAULT_AMOUNT, "1")
            .with_field(columns::AMOUNT_MIN, "0")
            .with_field(columns::AMOUNT_MAX, "")
            .with_field(columns::AMOUNT_INTERVAL, "0"))
    }

    #[test]
    fn test_import_rows_creates_then_updates() {
        let conn = setup();
        let importer = PackagingUnitImporter::new(
            conn.clone(),
            ImportOptions::default(),
            OutboxEventPublisher::new(EventOutboxRepository::from_connection(conn.clone())),
        );

        let first = importer.import_rows(vec![unit_row(1, "SKU-1")], None).unwrap();
        assert_eq!(first.created, 1);
        assert_eq!(first.batch.status, BatchStatus::Completed);

        let second = importer.import_rows(vec![unit_row(1, "SKU-1")], None).unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 1);

        let repo = PackagingUnitRepositoryImpl::from_connection(conn.clone());
        assert_eq!(repo.count().unwrap(), 1);

        let outbox = EventOutboxRepository::from_connection(conn);
        assert_eq!(outbox.count_pending().unwrap(), 2);
    }

    #[test]
    fn test_abort_stops_at_first_failure() {
        let conn = setup();
        let importer = PackagingUnitImporter::new(conn, ImportOptions::default(), NoOpEventPublisher);

        // SKU-2 无销售计量单位
        let summary = importer
            .import_rows(
                vec![unit_row(1, "SKU-2"), unit_row(2, "SKU-1")],
                Some("units.csv"),
            )
            .unwrap();

        assert!(summary.is_aborted());
        assert_eq!(summary.batch.total_rows, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].error_kind, "ENTITY_NOT_FOUND");
    }

    #[test]
    fn test_skip_records_failure_and_continues() {
        let conn = setup();
        let options = ImportOptions {
            error_policy: ErrorPolicy::Skip,
            bulk_size: 50,
            ..Default::default()
        };
        let importer = PackagingUnitImporter::new(conn, options, NoOpEventPublisher);

        let summary = importer
            .import_rows(
                vec![unit_row(1, "SKU-2"), unit_row(2, "SKU-1")],
                None,
            )
            .unwrap();

        assert_eq!(summary.batch.status, BatchStatus::CompletedWithErrors);
        assert_eq!(summary.batch.success_rows, 1);
        assert_eq!(summary.batch.failed_rows, 1);
        assert_eq!(summary.failures[0].row_number, 1);

        let stats = summary.cache_stats.unwrap();
        assert_eq!(stats.measurement_sales_unit.misses, 2);
        assert_eq!(stats.measurement_sales_unit.capacity, 500);
    }
}
