// ==========================================
// 包装单元导入 - 核心库
// ==========================================
// 职责: 产品包装单元数据导入
// 技术栈: Rust + SQLite
// 核心: 有界引用缓存 → 引用解析 → 行规范化 → 逐行写入 → 提交后发布
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 缓存/解析/规范化/写入/编排
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 发布事件
pub mod events;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 异步接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BatchStatus, ErrorPolicy, ImportBatch, ImportKind, ImportSummary, PackagingAmounts,
    PackagingUnitRecord, PackagingUnitRow, RowFailure,
};

// 导入组件
pub use importer::{
    ImportError, ImportOptions, ImportResult, LookupCache, PackagingUnitImporter,
    PackagingUnitTypeImporter, PackagingUnitWriter, ReferenceResolver, RowNormalizer,
};

// API
pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
