// ==========================================
// 包装单元导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::ErrorPolicy;
use crate::importer::error::ImportResult;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入编排器所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    /// 获取引用查找缓存容量（每个缓存独立）
    ///
    /// # 默认值
    /// - 500
    ///
    /// # 约束
    /// - 必须 ≥ 1，否则返回 ConfigValueError
    fn get_cache_capacity(&self) -> ImportResult<usize>;

    /// 获取每个事务包含的行数
    ///
    /// # 默认值
    /// - 1（逐行事务）
    fn get_bulk_size(&self) -> ImportResult<usize>;

    /// 获取行失败处理策略
    ///
    /// # 返回
    /// - ErrorPolicy::Abort: 首个失败行回滚当前事务并终止
    /// - ErrorPolicy::Skip: 记录失败行后继续
    ///
    /// # 默认值
    /// - ABORT
    fn get_error_policy(&self) -> ImportResult<ErrorPolicy>;
}
