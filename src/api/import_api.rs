// ==========================================
// 包装单元导入 - 导入API
// ==========================================
// 职责: 封装导入流程为异步接口（阻塞工作放入 spawn_blocking）
// 约束: 每次运行独立打开连接，运行之间互不共享事务与缓存
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::{
    BatchStatus, ImportBatch, ImportKind, ImportSummary, ResolverStats, RowFailure,
};
use crate::events::{EventPublisher, OutboxEventPublisher};
use crate::importer::{PackagingUnitImporter, PackagingUnitTypeImporter};
use crate::repository::{EventOutboxRepository, ImportBatchRepository};
use futures::future::join_all;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID
    pub batch_id: String,
    pub import_kind: ImportKind,
    pub status: BatchStatus,
    pub total_rows: i64,
    pub success_rows: i64,
    pub failed_rows: i64,
    /// 新建记录数
    pub created: usize,
    /// 更新记录数（类型导入时为已存在数）
    pub updated: usize,
    /// 失败行样本（完整明细通过 list_batch_failures 查询）
    pub failures: Vec<RowFailure>,
    /// 引用缓存统计（仅包装单元导入）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_stats: Option<ResolverStats>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl From<ImportSummary> for ImportApiResponse {
    fn from(summary: ImportSummary) -> Self {
        Self {
            batch_id: summary.batch.batch_id,
            import_kind: summary.batch.import_kind,
            status: summary.batch.status,
            total_rows: summary.batch.total_rows,
            success_rows: summary.batch.success_rows,
            failed_rows: summary.batch.failed_rows,
            created: summary.created,
            updated: summary.updated,
            failures: summary.failures,
            cache_stats: summary.cache_stats,
            elapsed_ms: summary.elapsed_time.as_millis() as i64,
        }
    }
}

/// 导入API
pub struct ImportApi {
    db_path: String,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl ImportApi {
    /// 创建新的ImportApi实例（会初始化表结构）
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        Ok(Self {
            db_path: db_path.to_string(),
            publisher: None,
        })
    }

    /// 替换事件发布者（默认写入 publish_event_outbox）
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn open_connection(db_path: &str) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    /// 导入包装单元
    ///
    /// # 参数
    /// - file_path: CSV 文件路径
    pub async fn import_packaging_units(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        self.run(ImportKind::PackagingUnit, file_path.to_string()).await
    }

    /// 导入包装单元类型
    pub async fn import_packaging_unit_types(
        &self,
        file_path: &str,
    ) -> ApiResult<ImportApiResponse> {
        self.run(ImportKind::PackagingUnitType, file_path.to_string()).await
    }

    /// 批量导入多个文件（并发执行，各文件独立成批）
    pub async fn batch_import(
        &self,
        kind: ImportKind,
        file_paths: Vec<String>,
    ) -> Vec<ApiResult<ImportApiResponse>> {
        info!(kind = kind.as_str(), count = file_paths.len(), "开始批量导入文件");

        let tasks = file_paths.into_iter().map(|path| async move {
            let result = self.run(kind, path.clone()).await;
            match &result {
                Ok(response) => info!(
                    file = %path,
                    batch_id = %response.batch_id,
                    status = response.status.as_str(),
                    "文件导入完成"
                ),
                Err(e) => error!(file = %path, error = %e, "文件导入失败"),
            }
            result
        });

        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );
        results
    }

    /// 查询最近的导入批次
    pub async fn list_recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> ApiResult<Vec<ImportBatch>> {
            let conn = Self::open_connection(&db_path)?;
            Ok(ImportBatchRepository::from_connection(conn).get_recent_batches(limit)?)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?
    }

    /// 查询批次失败行
    pub async fn list_batch_failures(&self, batch_id: &str) -> ApiResult<Vec<RowFailure>> {
        let db_path = self.db_path.clone();
        let batch_id = batch_id.to_string();
        tokio::task::spawn_blocking(move || -> ApiResult<Vec<RowFailure>> {
            let conn = Self::open_connection(&db_path)?;
            Ok(ImportBatchRepository::from_connection(conn).list_failures_by_batch(&batch_id)?)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?
    }

    async fn run(&self, kind: ImportKind, file_path: String) -> ApiResult<ImportApiResponse> {
        let db_path = self.db_path.clone();
        let publisher = self.publisher.clone();

        tokio::task::spawn_blocking(move || -> ApiResult<ImportApiResponse> {
            let conn = Self::open_connection(&db_path)?;
            let config = ConfigManager::from_connection(conn.clone())?;
            let snapshot = config.get_config_snapshot()?;

            let summary = match kind {
                ImportKind::PackagingUnit => {
                    let publisher: Arc<dyn EventPublisher> = match publisher {
                        Some(p) => p,
                        None => Arc::new(OutboxEventPublisher::new(
                            EventOutboxRepository::from_connection(conn.clone()),
                        )),
                    };
                    PackagingUnitImporter::from_config(conn, &config, publisher)?
                        .with_config_snapshot(snapshot)
                        .import_file(&file_path)?
                }
                ImportKind::PackagingUnitType => {
                    PackagingUnitTypeImporter::from_config(conn, &config)?
                        .with_config_snapshot(snapshot)
                        .import_file(&file_path)?
                }
            };

            Ok(ImportApiResponse::from(summary))
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?
    }
}
