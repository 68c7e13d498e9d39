// ==========================================
// 包装单元导入 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 布尔标记 / 精确小数解析
// 红线: 不认识的原始值直接报错，不做静默转换
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use rust_decimal::Decimal;
use std::str::FromStr;

pub struct DataCleaner;

impl DataCleaner {
    /// 空白视为 NULL
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 布尔标记（1/0、Y/N、TRUE/FALSE、是/否；空白为否）
    pub fn parse_flag(&self, value: &str, field: &str, row: usize) -> ImportResult<bool> {
        match value.trim().to_uppercase().as_str() {
            "1" | "Y" | "YES" | "TRUE" | "是" => Ok(true),
            "" | "0" | "N" | "NO" | "FALSE" | "否" => Ok(false),
            _ => Err(ImportError::InvalidValue {
                row,
                field: field.to_string(),
                value: value.to_string(),
                message: "无法识别的布尔值".to_string(),
            }),
        }
    }

    /// 可空小数（空白为 None）
    pub fn parse_optional_decimal(
        &self,
        value: &str,
        field: &str,
        row: usize,
    ) -> ImportResult<Option<Decimal>> {
        match self.normalize_null(Some(value)) {
            None => Ok(None),
            Some(v) => Decimal::from_str(&v)
                .map(Some)
                .map_err(|e| ImportError::InvalidValue {
                    row,
                    field: field.to_string(),
                    value: v,
                    message: e.to_string(),
                }),
        }
    }

    /// 必填小数
    pub fn parse_decimal(&self, value: &str, field: &str, row: usize) -> ImportResult<Decimal> {
        self.parse_optional_decimal(value, field, row)?
            .ok_or_else(|| ImportError::InvalidValue {
                row,
                field: field.to_string(),
                value: value.to_string(),
                message: "必填数值为空".to_string(),
            })
    }
}
