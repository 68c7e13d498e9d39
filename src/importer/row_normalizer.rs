// ==========================================
// 包装单元导入 - 行规范化器
// ==========================================
// 规则（顺序执行）:
// 1. is_amount_variable 转为布尔
// 2. 可变数量且 interval == 0 → interval = 1
// 3. 可变数量且 min == 0 → min = interval（取第 2 步之后的值）
// 4. 非可变数量 → min / max / interval 全部置空
// 零值判断使用精确小数；空单元格按 0 处理（仅第 2、3 步）
// ==========================================

use crate::domain::{PackagingAmounts, RawPackagingAmounts};
use crate::domain::columns;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use rust_decimal::Decimal;

/// 可变数量时 interval 的默认值
pub const AMOUNT_INTERVAL_DEFAULT: Decimal = Decimal::ONE;

pub struct RowNormalizer {
    cleaner: DataCleaner,
}

impl RowNormalizer {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    pub fn normalize(&self, raw: &RawPackagingAmounts, row: usize) -> ImportResult<PackagingAmounts> {
        let is_amount_variable =
            self.cleaner
                .parse_flag(&raw.is_amount_variable, columns::IS_AMOUNT_VARIABLE, row)?;

        if !is_amount_variable {
            return Ok(PackagingAmounts {
                is_amount_variable,
                default_amount: raw.default_amount,
                amount_min: None,
                amount_max: None,
                amount_interval: None,
            });
        }

        let amount_interval = match raw.amount_interval {
            Some(interval) if !interval.is_zero() => interval,
            _ => AMOUNT_INTERVAL_DEFAULT,
        };

        let amount_min = match raw.amount_min {
            Some(min) if !min.is_zero() => min,
            _ => amount_interval,
        };

        Ok(PackagingAmounts {
            is_amount_variable,
            default_amount: raw.default_amount,
            amount_min: Some(amount_min),
            amount_max: raw.amount_max,
            amount_interval: Some(amount_interval),
        })
    }
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
