// ==========================================
// 包装单元导入 - 事务边界（UnitOfWork）
// ==========================================
// 职责: 由导入编排器控制 BEGIN / COMMIT / ROLLBACK
// 说明: 各 Repository 共享同一连接，事务状态属于连接，
//       因此事务内的所有写入由同一 UnitOfWork 原子提交
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::lock_connection;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub trait UnitOfWork {
    fn begin(&self) -> RepositoryResult<()>;
    fn commit(&self) -> RepositoryResult<()>;
    fn rollback(&self) -> RepositoryResult<()>;
}

pub struct SqliteUnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUnitOfWork {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn run(&self, sql: &str) -> RepositoryResult<()> {
        let conn = lock_connection(&self.conn)?;
        conn.execute_batch(sql)
            .map_err(|e| RepositoryError::DatabaseTransactionError(format!("{}: {}", sql, e)))
    }
}

impl UnitOfWork for SqliteUnitOfWork {
    fn begin(&self) -> RepositoryResult<()> {
        self.run("BEGIN IMMEDIATE")
    }

    fn commit(&self) -> RepositoryResult<()> {
        self.run("COMMIT")
    }

    fn rollback(&self) -> RepositoryResult<()> {
        let conn = lock_connection(&self.conn)?;
        // 语句失败时 SQLite 可能已自动回滚
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK")
            .map_err(|e| RepositoryError::DatabaseTransactionError(format!("ROLLBACK: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn count(conn: &Arc<Mutex<Connection>>) -> i64 {
        conn.lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_persists_writes() {
        let conn = setup();
        let uow = SqliteUnitOfWork::from_connection(conn.clone());

        uow.begin().unwrap();
        conn.lock().unwrap().execute("INSERT INTO t VALUES (1)", []).unwrap();
        uow.commit().unwrap();

        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_rollback_discards_writes() {
        let conn = setup();
        let uow = SqliteUnitOfWork::from_connection(conn.clone());

        uow.begin().unwrap();
        conn.lock().unwrap().execute("INSERT INTO t VALUES (1)", []).unwrap();
        uow.rollback().unwrap();

        assert_eq!(count(&conn), 0);
        // 无活动事务时回滚为空操作
        uow.rollback().unwrap();
    }
}
