// ==========================================
// 包装单元导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型
// 红线: 不含数据访问逻辑,不含导入流程
// ==========================================

pub mod import;
pub mod packaging_unit;

// 重导出核心类型
pub use import::{
    BatchStatus, CacheStats, ErrorPolicy, ImportBatch, ImportKind, ImportSummary, RawRow,
    ResolverStats, RowFailure,
};
pub use packaging_unit::{
    columns, PackagingAmounts, PackagingUnitRecord, PackagingUnitRow, PackagingUnitTypeRow,
    RawPackagingAmounts, WriteOutcome,
};
