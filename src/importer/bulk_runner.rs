// ==========================================
// 包装单元导入 - 批量事务驱动
// ==========================================
// 职责: 按 bulk_size 分组开启/提交事务，执行失败策略，
//       记录失败行与批次，提交后分发事件
// 红线: 事件仅在 COMMIT 成功后分发；ROLLBACK 时整体丢弃
// 红线: 失败行在所属事务结束（COMMIT / ROLLBACK）后立即落库，
//       不随 ABORT 回滚丢失；内存中只保留计数与有限样本
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{
    BatchStatus, ErrorPolicy, ImportBatch, ImportKind, RawRow, RowFailure, WriteOutcome,
};
use crate::events::{EventBuffer, EventPublisher};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::lookup_cache::DEFAULT_CACHE_CAPACITY;
use crate::repository::{ImportBatchRepository, UnitOfWork};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ==========================================
// ImportOptions - 单次导入参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub cache_capacity: usize,
    pub bulk_size: usize,
    pub error_policy: ErrorPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            bulk_size: 1,
            error_policy: ErrorPolicy::Abort,
        }
    }
}

impl ImportOptions {
    /// 从配置读取导入参数
    pub fn from_config<C: ImportConfigReader + ?Sized>(config: &C) -> ImportResult<Self> {
        Ok(Self {
            cache_capacity: config.get_cache_capacity()?,
            bulk_size: config.get_bulk_size()?,
            error_policy: config.get_error_policy()?,
        })
    }
}

/// 汇总中保留的失败行样本上限，完整记录见 import_row_failure
pub const FAILURE_SAMPLE_LIMIT: usize = 100;

// ==========================================
// RunTally - 运行计数
// ==========================================
#[derive(Debug, Default)]
pub(crate) struct RunTally {
    pub total_rows: usize,
    pub success_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub failed_rows: usize,
    /// 前 FAILURE_SAMPLE_LIMIT 条失败行
    pub failure_sample: Vec<RowFailure>,
    pub aborted: bool,
    pub events_published: usize,
}

/// 当前未提交事务内的计数与失败行（最多 bulk_size 条）
#[derive(Debug, Default)]
struct OpenBulk {
    rows: usize,
    created: usize,
    updated: usize,
    failures: Vec<RowFailure>,
}

impl OpenBulk {
    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created => self.created += 1,
            WriteOutcome::Updated => self.updated += 1,
        }
    }
}

// ==========================================
// BulkRunner - 批量事务驱动
// ==========================================
pub(crate) struct BulkRunner<'a, U, P>
where
    U: UnitOfWork + ?Sized,
    P: EventPublisher + ?Sized,
{
    uow: &'a U,
    publisher: &'a P,
    batch_repo: &'a ImportBatchRepository,
    options: ImportOptions,
    import_kind: ImportKind,
    batch_id: String,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl<'a, U, P> BulkRunner<'a, U, P>
where
    U: UnitOfWork + ?Sized,
    P: EventPublisher + ?Sized,
{
    pub fn new(
        uow: &'a U,
        publisher: &'a P,
        batch_repo: &'a ImportBatchRepository,
        options: ImportOptions,
        import_kind: ImportKind,
    ) -> Self {
        Self {
            uow,
            publisher,
            batch_repo,
            options,
            import_kind,
            batch_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    /// 执行导入循环
    ///
    /// `process` 对单行完成映射与写入，失败行按策略处理；
    /// 基础设施错误（BEGIN / COMMIT / 事件分发 / 失败行落库）直接返回 Err
    ///
    /// 源文件读取错误优先使用错误自带的行号，否则按上一行递推
    pub fn run<I, F>(&self, rows: I, mut process: F) -> ImportResult<RunTally>
    where
        I: IntoIterator<Item = ImportResult<RawRow>>,
        F: FnMut(&RawRow, &mut EventBuffer) -> ImportResult<WriteOutcome>,
    {
        let bulk_size = self.options.bulk_size.max(1);
        let mut tally = RunTally::default();
        let mut events = EventBuffer::new();
        let mut open: Option<OpenBulk> = None;
        let mut last_row_number = 0usize;

        for item in rows {
            tally.total_rows += 1;

            if open.is_none() {
                self.uow.begin()?;
            }
            let bulk = open.get_or_insert_with(OpenBulk::default);
            bulk.rows += 1;

            let result = match item {
                Ok(row) => {
                    last_row_number = row.row_number;
                    process(&row, &mut events).map_err(|e| (row, e))
                }
                Err(e) => {
                    last_row_number = e.row_number().unwrap_or(last_row_number + 1);
                    Err((RawRow::new(last_row_number), e))
                }
            };

            match result {
                Ok(outcome) => bulk.record(outcome),
                Err((row, e)) => {
                    warn!(
                        batch_id = %self.batch_id,
                        row_number = row.row_number,
                        error_kind = e.kind(),
                        error = %e,
                        "行导入失败"
                    );
                    bulk.failures.push(self.failure_for(&row, &e));

                    if self.options.error_policy == ErrorPolicy::Abort {
                        self.uow.rollback()?;
                        let discarded = events.len();
                        events.discard();
                        if let Some(bulk) = open.take() {
                            info!(
                                batch_id = %self.batch_id,
                                rolled_back_rows = bulk.rows,
                                discarded_events = discarded,
                                "ABORT: 当前事务已回滚，导入终止"
                            );
                            self.record_failures(bulk.failures, &mut tally)?;
                        }
                        tally.aborted = true;
                        break;
                    }
                }
            }

            if open.as_ref().is_some_and(|bulk| bulk.rows >= bulk_size) {
                if let Some(bulk) = open.take() {
                    self.commit_bulk(bulk, &mut events, &mut tally)?;
                }
            }
        }

        if let Some(bulk) = open.take() {
            self.commit_bulk(bulk, &mut events, &mut tally)?;
        }

        Ok(tally)
    }

    fn commit_bulk(
        &self,
        bulk: OpenBulk,
        events: &mut EventBuffer,
        tally: &mut RunTally,
    ) -> ImportResult<()> {
        if let Err(e) = self.uow.commit() {
            error!(batch_id = %self.batch_id, error = %e, "事务提交失败");
            events.discard();
            // COMMIT 失败时连接可能仍处于事务中
            self.uow.rollback()?;
            return Err(e.into());
        }

        tally.success_rows += bulk.created + bulk.updated;
        tally.created += bulk.created;
        tally.updated += bulk.updated;

        let pending = events.drain();
        if !pending.is_empty() {
            tally.events_published += self.publisher.publish(&pending, Some(&self.batch_id))?;
        }

        debug!(
            batch_id = %self.batch_id,
            rows = bulk.rows,
            created = bulk.created,
            updated = bulk.updated,
            failed = bulk.failures.len(),
            events = pending.len(),
            "事务已提交"
        );
        self.record_failures(bulk.failures, tally)
    }

    /// 失败行落库（事务外），计数并保留样本
    fn record_failures(&self, failures: Vec<RowFailure>, tally: &mut RunTally) -> ImportResult<()> {
        for failure in failures {
            self.batch_repo.insert_failure(&failure)?;
            tally.failed_rows += 1;
            if tally.failure_sample.len() < FAILURE_SAMPLE_LIMIT {
                tally.failure_sample.push(failure);
            }
        }
        Ok(())
    }

    fn failure_for(&self, row: &RawRow, e: &ImportError) -> RowFailure {
        RowFailure {
            failure_id: Uuid::new_v4().to_string(),
            batch_id: self.batch_id.clone(),
            row_number: row.row_number,
            error_kind: e.kind().to_string(),
            message: e.to_string(),
            raw_data: row.to_json(),
            created_at: Utc::now(),
        }
    }

    /// 生成并写入批次记录
    pub fn finish(
        &self,
        tally: &RunTally,
        file_path: Option<&str>,
        config_snapshot: Option<String>,
    ) -> ImportResult<ImportBatch> {
        let status = if tally.aborted {
            BatchStatus::Aborted
        } else if tally.failed_rows == 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::CompletedWithErrors
        };

        let batch = ImportBatch {
            batch_id: self.batch_id.clone(),
            import_kind: self.import_kind,
            file_path: file_path.map(str::to_string),
            total_rows: tally.total_rows as i64,
            success_rows: tally.success_rows as i64,
            failed_rows: tally.failed_rows as i64,
            status,
            started_at: self.started_at,
            completed_at: Utc::now(),
            elapsed_ms: self.started.elapsed().as_millis() as i64,
            config_snapshot,
        };
        self.batch_repo.insert_batch(&batch)?;
        Ok(batch)
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}
