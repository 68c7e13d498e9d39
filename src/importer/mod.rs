// ==========================================
// 包装单元导入 - 导入层
// ==========================================
// 职责: 外部 CSV 数据 → 包装单元 / 包装单元类型
// 组成: 查找缓存 → 引用解析 → 行规范化 → 行写入 → 批量事务编排
// ==========================================

// 模块声明
pub mod bulk_runner;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod lookup_cache;
pub mod packaging_unit_importer;
pub mod reference_resolver;
pub mod row_normalizer;
pub mod row_writer;
pub mod type_importer;

// 重导出核心类型
pub use bulk_runner::{ImportOptions, FAILURE_SAMPLE_LIMIT};
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::CsvRowSource;
pub use lookup_cache::{LookupCache, DEFAULT_CACHE_CAPACITY};
pub use packaging_unit_importer::PackagingUnitImporter;
pub use reference_resolver::ReferenceResolver;
pub use row_normalizer::{RowNormalizer, AMOUNT_INTERVAL_DEFAULT};
pub use row_writer::PackagingUnitWriter;
pub use type_importer::PackagingUnitTypeImporter;
