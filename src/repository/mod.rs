// ==========================================
// 包装单元导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 事务边界由 UnitOfWork 控制，Repository 内不开启事务
// ==========================================

pub mod error;
pub mod event_outbox_repo;
pub mod import_batch_repo;
pub mod packaging_unit_repo;
pub mod packaging_unit_repo_impl;
pub mod reference_repo;
pub mod unit_of_work;

use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use event_outbox_repo::{EventOutboxRepository, OutboxEntry};
pub use import_batch_repo::ImportBatchRepository;
pub use packaging_unit_repo::{PackagingUnitRepository, PackagingUnitTypeRepository};
pub use packaging_unit_repo_impl::{PackagingUnitRepositoryImpl, PackagingUnitTypeRepositoryImpl};
pub use reference_repo::{ReferenceLookupRepository, ReferenceRepositoryImpl};
pub use unit_of_work::{SqliteUnitOfWork, UnitOfWork};

/// 获取共享连接
pub(crate) fn lock_connection(
    conn: &Arc<Mutex<Connection>>,
) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}
