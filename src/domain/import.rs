// ==========================================
// 包装单元导入 - 导入批次领域模型
// ==========================================
// 职责: 导入批次、失败行、导入汇总、错误策略
// 对齐: import_batch / import_row_failure 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ==========================================
// ImportKind - 导入类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportKind {
    /// 包装单元（product_packaging_unit）
    PackagingUnit,
    /// 包装单元类型（product_packaging_unit_type）
    PackagingUnitType,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::PackagingUnit => "PACKAGING_UNIT",
            ImportKind::PackagingUnitType => "PACKAGING_UNIT_TYPE",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// RawRow - 文件解析后的原始行
// ==========================================
// 列名 → 原始单元格文本（已 TRIM）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 数据行号（从 1 开始，不含表头）
    pub row_number: usize,
    pub fields: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, column: &str, value: &str) -> Self {
        self.fields.insert(column.to_string(), value.to_string());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_else(|_| "{}".to_string())
    }
}

// ==========================================
// ErrorPolicy - 行失败处理策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorPolicy {
    /// 首个失败行回滚当前事务并终止导入
    #[default]
    Abort,
    /// 记录失败行后继续
    Skip,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Abort => "ABORT",
            ErrorPolicy::Skip => "SKIP",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ABORT" => Ok(ErrorPolicy::Abort),
            "SKIP" => Ok(ErrorPolicy::Skip),
            other => Err(format!("未知的错误策略: {}", other)),
        }
    }
}

// ==========================================
// BatchStatus - 批次状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// 全部行成功
    Completed,
    /// 部分行失败（SKIP 策略）
    CompletedWithErrors,
    /// 因失败行终止（ABORT 策略）
    Aborted,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            BatchStatus::Aborted => "ABORTED",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "COMPLETED" => BatchStatus::Completed,
            "COMPLETED_WITH_ERRORS" => BatchStatus::CompletedWithErrors,
            _ => BatchStatus::Aborted,
        }
    }
}

// ==========================================
// RowFailure - 失败行记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFailure {
    pub failure_id: String,
    pub batch_id: String,
    pub row_number: usize,
    /// 错误分类（ENTITY_NOT_FOUND / MISSING_COLUMN / ...）
    pub error_kind: String,
    pub message: String,
    /// 原始行 JSON
    pub raw_data: String,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub import_kind: ImportKind,
    pub file_path: Option<String>,
    pub total_rows: i64,
    pub success_rows: i64,
    pub failed_rows: i64,
    pub status: BatchStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    /// 导入时的配置快照（JSON）
    pub config_snapshot: Option<String>,
}

// ==========================================
// CacheStats - 查找缓存统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// 容量溢出导致的整体清空次数
    pub clears: u64,
    pub size: usize,
    pub capacity: usize,
}

/// 三个引用缓存的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverStats {
    pub packaging_unit_type: CacheStats,
    pub product: CacheStats,
    pub measurement_sales_unit: CacheStats,
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch: ImportBatch,
    pub created: usize,
    pub updated: usize,
    /// 失败行样本（有上限），总数见 batch.failed_rows
    pub failures: Vec<RowFailure>,
    pub cache_stats: Option<ResolverStats>,
    #[serde(skip)]
    pub elapsed_time: Duration,
}

impl ImportSummary {
    pub fn is_aborted(&self) -> bool {
        self.batch.status == BatchStatus::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_policy_from_str() {
        assert_eq!("abort".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Abort);
        assert_eq!(" SKIP ".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Skip);
        assert!("retry".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn test_batch_status_roundtrip_str() {
        for status in [
            BatchStatus::Completed,
            BatchStatus::CompletedWithErrors,
            BatchStatus::Aborted,
        ] {
            assert_eq!(BatchStatus::parse(status.as_str()), status);
        }
    }
}
