// ==========================================
// 包装单元导入 - 发布事件 Outbox Repository
// ==========================================
// 职责: publish_event_outbox 表读写
// 说明: 下游按 at-least-once 消费 dispatched = 0 的记录
// ==========================================

use crate::events::PublishEvent;
use crate::repository::error::RepositoryResult;
use crate::repository::lock_connection;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// Outbox 中的一条待分发事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: i64,
    pub event: PublishEvent,
    pub batch_id: Option<String>,
}

pub struct EventOutboxRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EventOutboxRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 追加事件
    pub fn append(&self, event: &PublishEvent, batch_id: Option<&str>) -> RepositoryResult<i64> {
        let conn = lock_connection(&self.conn)?;
        conn.execute(
            r#"
            INSERT INTO publish_event_outbox (event_name, entity_id, batch_id, created_at, dispatched)
            VALUES (?1, ?2, ?3, ?4, 0)
            "#,
            params![event.event_name, event.entity_id, batch_id, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询未分发事件（按写入顺序）
    pub fn list_pending(&self, limit: usize) -> RepositoryResult<Vec<OutboxEntry>> {
        let conn = lock_connection(&self.conn)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, event_name, entity_id, batch_id
            FROM publish_event_outbox WHERE dispatched = 0 ORDER BY id LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(OutboxEntry {
                id: row.get(0)?,
                event: PublishEvent {
                    event_name: row.get(1)?,
                    entity_id: row.get(2)?,
                },
                batch_id: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 统计未分发事件数
    pub fn count_pending(&self) -> RepositoryResult<usize> {
        let conn = lock_connection(&self.conn)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM publish_event_outbox WHERE dispatched = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::events::PACKAGING_UNIT_PUBLISH;

    #[test]
    fn test_append_and_list_pending() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let repo = EventOutboxRepository::from_connection(Arc::new(Mutex::new(conn)));

        repo.append(&PublishEvent::new(PACKAGING_UNIT_PUBLISH, 1), Some("B1"))
            .unwrap();
        repo.append(&PublishEvent::new(PACKAGING_UNIT_PUBLISH, 2), None)
            .unwrap();

        let pending = repo.list_pending(10).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].event.entity_id, 1);
        assert_eq!(pending[0].batch_id.as_deref(), Some("B1"));

        assert_eq!(repo.count_pending().unwrap(), 2);
    }
}
