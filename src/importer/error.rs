// ==========================================
// 包装单元导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 引用解析错误（行级致命，不重试不默认）=====
    #[error("{entity} 未找到: {key}")]
    EntityNotFound { entity: String, key: String },

    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败 (行 {row}): {message}")]
    CsvParseError { row: usize, message: String },

    // ===== 数据映射错误 =====
    #[error("缺少必填列 (行 {row}): {column}")]
    MissingColumn { row: usize, column: String },

    #[error("字段值错误 (行 {row}, 字段 {field}): {value} - {message}")]
    InvalidValue {
        row: usize,
        field: String,
        value: String,
        message: String,
    },

    // ===== 配置错误 =====
    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误（原样透传）=====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    pub fn entity_not_found(entity: &str, key: &str) -> Self {
        ImportError::EntityNotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    /// 失败行记录中的错误分类
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            ImportError::MissingColumn { .. } => "MISSING_COLUMN",
            ImportError::InvalidValue { .. } => "INVALID_VALUE",
            ImportError::Repository(_) => "PERSISTENCE",
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::CsvParseError { .. } => "FILE",
            ImportError::ConfigValueError { .. } => "CONFIG",
            ImportError::Other(_) => "INTERNAL",
        }
    }

    /// 错误携带的数据行号（1 起，表头为 0）
    pub fn row_number(&self) -> Option<usize> {
        match self {
            ImportError::CsvParseError { row, .. }
            | ImportError::MissingColumn { row, .. }
            | ImportError::InvalidValue { row, .. } => Some(*row),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

// 实现 From<csv::Error>
// 行号取 csv 记录序号（表头为 0）；数据行由 CsvRowSource 按自身计数覆盖
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        let row = err.position().map(|p| p.record() as usize).unwrap_or(0);
        ImportError::CsvParseError {
            row,
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(
            ImportError::entity_not_found("产品", "SKU-1").kind(),
            "ENTITY_NOT_FOUND"
        );
        let err: ImportError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(err.kind(), "PERSISTENCE");
    }

    #[test]
    fn test_row_number_carried_by_row_errors() {
        let err = ImportError::CsvParseError {
            row: 3,
            message: "invalid utf-8".to_string(),
        };
        assert_eq!(err.row_number(), Some(3));
        assert_eq!(err.kind(), "FILE");
        assert_eq!(ImportError::entity_not_found("产品", "SKU-1").row_number(), None);
    }

    #[test]
    fn test_entity_not_found_message() {
        let err = ImportError::entity_not_found("包装单元类型", "crate");
        assert_eq!(err.to_string(), "包装单元类型 未找到: crate");
    }
}
