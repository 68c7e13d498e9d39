// ==========================================
// 包装单元导入 - 发布事件
// ==========================================
// 职责: 定义发布事件、事务内事件缓冲、事件发布 trait
// 说明: 写入器只向 EventBuffer 排队；编排器在事务提交后
//       才把缓冲区交给 EventPublisher，回滚时整体丢弃
// ==========================================

use crate::repository::{EventOutboxRepository, RepositoryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// 包装单元发布事件名（下游据此重建索引）
pub const PACKAGING_UNIT_PUBLISH: &str = "packaging_unit.publish";

/// 发布事件
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublishEvent {
    pub event_name: String,
    pub entity_id: i64,
}

impl PublishEvent {
    pub fn new(event_name: &str, entity_id: i64) -> Self {
        Self {
            event_name: event_name.to_string(),
            entity_id,
        }
    }
}

// ==========================================
// EventBuffer - 事务内待发布事件
// ==========================================
// 同一事务内相同 (event_name, entity_id) 只保留一次，保持首次入队顺序
#[derive(Debug, Default)]
pub struct EventBuffer {
    pending: Vec<PublishEvent>,
    seen: HashSet<PublishEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 排队一个事件
    pub fn add(&mut self, event_name: &str, entity_id: i64) {
        let event = PublishEvent::new(event_name, entity_id);
        if self.seen.insert(event.clone()) {
            self.pending.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn events(&self) -> &[PublishEvent] {
        &self.pending
    }

    /// 取出全部事件并清空缓冲
    pub fn drain(&mut self) -> Vec<PublishEvent> {
        self.seen.clear();
        std::mem::take(&mut self.pending)
    }

    /// 丢弃全部事件（事务回滚）
    pub fn discard(&mut self) {
        self.seen.clear();
        self.pending.clear();
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 事件发布者
///
/// 在事务提交后调用；下游按 at-least-once 语义消费
pub trait EventPublisher: Send + Sync {
    fn publish(&self, events: &[PublishEvent], batch_id: Option<&str>) -> RepositoryResult<usize>;
}

/// 空操作事件发布者
///
/// 用于不需要下游分发的场景
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl EventPublisher for NoOpEventPublisher {
    fn publish(&self, events: &[PublishEvent], _batch_id: Option<&str>) -> RepositoryResult<usize> {
        tracing::debug!(count = events.len(), "NoOpEventPublisher: 跳过事件发布");
        Ok(0)
    }
}

/// Outbox 事件发布者（写入 publish_event_outbox 表）
pub struct OutboxEventPublisher {
    outbox: EventOutboxRepository,
}

impl OutboxEventPublisher {
    pub fn new(outbox: EventOutboxRepository) -> Self {
        Self { outbox }
    }
}

impl EventPublisher for OutboxEventPublisher {
    fn publish(&self, events: &[PublishEvent], batch_id: Option<&str>) -> RepositoryResult<usize> {
        for event in events {
            self.outbox.append(event, batch_id)?;
        }
        tracing::debug!(count = events.len(), "事件已写入 outbox");
        Ok(events.len())
    }
}

impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    fn publish(&self, events: &[PublishEvent], batch_id: Option<&str>) -> RepositoryResult<usize> {
        (**self).publish(events, batch_id)
    }
}
