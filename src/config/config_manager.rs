// ==========================================
// 包装单元导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::ErrorPolicy;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::lookup_cache::DEFAULT_CACHE_CAPACITY;
use crate::repository::{lock_connection, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = lock_connection(&conn)?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = lock_connection(&self.conn)?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        if key.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "key".to_string(),
                message: "配置键不能为空".to_string(),
            });
        }

        let conn = lock_connection(&self.conn)?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取 global 配置快照（JSON，键有序）
    ///
    /// 用于记录到每个导入批次，便于事后追溯导入时的参数
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = lock_connection(&self.conn)?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    fn get_positive_usize(&self, key: &str, default: usize) -> ImportResult<usize> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(ImportError::ConfigValueError {
                key: key.to_string(),
                value,
                message: "必须是不小于 1 的整数".to_string(),
            }),
        }
    }
}

// ==========================================
// ImportConfigReader 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_cache_capacity(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::CACHE_CAPACITY, DEFAULT_CACHE_CAPACITY)
    }

    fn get_bulk_size(&self) -> ImportResult<usize> {
        self.get_positive_usize(config_keys::BULK_SIZE, 1)
    }

    fn get_error_policy(&self) -> ImportResult<ErrorPolicy> {
        let value = self.get_config_or_default(config_keys::ERROR_POLICY, "ABORT")?;
        value
            .parse::<ErrorPolicy>()
            .map_err(|message| ImportError::ConfigValueError {
                key: config_keys::ERROR_POLICY.to_string(),
                value,
                message,
            })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 引用查找缓存
    pub const CACHE_CAPACITY: &str = "import/cache_capacity";

    // 事务粒度
    pub const BULK_SIZE: &str = "import/bulk_size";

    // 失败策略: ABORT | SKIP
    pub const ERROR_POLICY: &str = "import/error_policy";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = setup();
        assert_eq!(config.get_cache_capacity().unwrap(), 500);
        assert_eq!(config.get_bulk_size().unwrap(), 1);
        assert_eq!(config.get_error_policy().unwrap(), ErrorPolicy::Abort);
    }

    #[test]
    fn test_overrides_are_read_back() {
        let config = setup();
        config.set_config_value(config_keys::CACHE_CAPACITY, "50").unwrap();
        config.set_config_value(config_keys::BULK_SIZE, "200").unwrap();
        config.set_config_value(config_keys::ERROR_POLICY, "skip").unwrap();

        assert_eq!(config.get_cache_capacity().unwrap(), 50);
        assert_eq!(config.get_bulk_size().unwrap(), 200);
        assert_eq!(config.get_error_policy().unwrap(), ErrorPolicy::Skip);

        // 覆写
        config.set_config_value(config_keys::BULK_SIZE, "10").unwrap();
        assert_eq!(config.get_bulk_size().unwrap(), 10);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = setup();
        config.set_config_value(config_keys::CACHE_CAPACITY, "0").unwrap();

        let err = config.get_cache_capacity().unwrap_err();
        assert!(matches!(err, ImportError::ConfigValueError { .. }));
        assert_eq!(err.kind(), "CONFIG");
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let config = setup();
        config.set_config_value(config_keys::ERROR_POLICY, "RETRY").unwrap();
        assert!(config.get_error_policy().is_err());
    }

    #[test]
    fn test_snapshot_is_sorted_json() {
        let config = setup();
        config.set_config_value(config_keys::ERROR_POLICY, "SKIP").unwrap();
        config.set_config_value(config_keys::BULK_SIZE, "5").unwrap();

        let snapshot = config.get_config_snapshot().unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(parsed.get(config_keys::BULK_SIZE).map(String::as_str), Some("5"));
        assert_eq!(parsed.get(config_keys::ERROR_POLICY).map(String::as_str), Some("SKIP"));
        assert!(snapshot.find("bulk_size").unwrap() < snapshot.find("error_policy").unwrap());
    }
}
