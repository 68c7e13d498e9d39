// ==========================================
// 包装单元导入 - 包装单元 Repository Trait
// ==========================================
// 职责: 定义包装单元及类型的数据访问接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::PackagingUnitRecord;
use crate::repository::error::RepositoryResult;

// ==========================================
// PackagingUnitRepository Trait
// ==========================================
// 用途: 包装单元记录读写（按产品 find-or-create）
// 实现者: PackagingUnitRepositoryImpl（使用 rusqlite）
pub trait PackagingUnitRepository {
    /// 按产品 ID 查询包装单元记录
    ///
    /// # 返回
    /// - Ok(Some(record)): 已存在
    /// - Ok(None): 不存在
    fn find_by_product_id(&self, product_id: i64) -> RepositoryResult<Option<PackagingUnitRecord>>;

    /// 保存记录（id 为空时插入，否则按 id 更新）
    ///
    /// 插入后回填 id；同时刷新 created_at / updated_at。
    /// 事务由调用方（UnitOfWork）控制。
    fn save(&self, record: &mut PackagingUnitRecord) -> RepositoryResult<()>;

    /// 统计记录数
    fn count(&self) -> RepositoryResult<usize>;
}

// ==========================================
// PackagingUnitTypeRepository Trait
// ==========================================
// 用途: 包装单元类型导入（按名称 find-or-create）
pub trait PackagingUnitTypeRepository {
    /// 按名称查询类型 ID
    fn find_id_by_name(&self, name: &str) -> RepositoryResult<Option<i64>>;

    /// 新建类型，返回 ID
    fn create(&self, name: &str) -> RepositoryResult<i64>;
}
