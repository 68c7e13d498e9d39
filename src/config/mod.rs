// ==========================================
// 包装单元导入 - 配置层
// ==========================================
// 职责: 导入参数管理（缓存容量、事务粒度、失败策略）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
