// ==========================================
// 包装单元导入 - 包装单元领域模型
// ==========================================
// 职责: 包装单元记录、导入行中间结构、数量字段
// 对齐: product_packaging_unit 表
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// 导入列名
// ==========================================
pub mod columns {
    pub const CONCRETE_SKU: &str = "CONCRETE_SKU";
    pub const LEAD_PRODUCT_SKU: &str = "LEAD_PRODUCT_SKU";
    pub const TYPE_NAME: &str = "TYPE_NAME";
    pub const IS_AMOUNT_VARIABLE: &str = "IS_AMOUNT_VARIABLE";
    pub const DEFAULT_AMOUNT: &str = "DEFAULT_AMOUNT";
    pub const AMOUNT_MIN: &str = "AMOUNT_MIN";
    pub const AMOUNT_MAX: &str = "AMOUNT_MAX";
    pub const AMOUNT_INTERVAL: &str = "AMOUNT_INTERVAL";

    /// 包装单元类型导入列
    pub const NAME: &str = "NAME";

    /// 包装单元导入必填列（每行必须全部存在）
    pub const REQUIRED: [&str; 8] = [
        CONCRETE_SKU,
        LEAD_PRODUCT_SKU,
        TYPE_NAME,
        IS_AMOUNT_VARIABLE,
        DEFAULT_AMOUNT,
        AMOUNT_MIN,
        AMOUNT_MAX,
        AMOUNT_INTERVAL,
    ];
}

// ==========================================
// PackagingUnitRecord - 包装单元记录
// ==========================================
// 主键: id_product_packaging_unit（新建时为 None）
// 唯一: product_id（每个产品至多一条）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingUnitRecord {
    pub id: Option<i64>,
    pub product_id: i64,
    pub lead_product_id: i64,
    pub packaging_unit_type_id: i64,
    pub is_amount_variable: bool,
    pub default_amount: Decimal,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
    pub amount_interval: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PackagingUnitRecord {
    /// 为产品构造一条尚未落库的记录（其余字段由写入器填充）
    pub fn new_for_product(product_id: i64) -> Self {
        Self {
            id: None,
            product_id,
            lead_product_id: product_id,
            packaging_unit_type_id: 0,
            is_amount_variable: false,
            default_amount: Decimal::ONE,
            amount_min: None,
            amount_max: None,
            amount_interval: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// 写入规范化后的数量字段
    pub fn apply_amounts(&mut self, amounts: &PackagingAmounts) {
        self.is_amount_variable = amounts.is_amount_variable;
        self.default_amount = amounts.default_amount;
        self.amount_min = amounts.amount_min;
        self.amount_max = amounts.amount_max;
        self.amount_interval = amounts.amount_interval;
    }
}

// ==========================================
// RawPackagingAmounts - 数量字段组（未规范化）
// ==========================================
// is_amount_variable 保留源单元格文本，由规范化器转换
// 空单元格以 None 表示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPackagingAmounts {
    pub is_amount_variable: String,
    pub default_amount: Decimal,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
    pub amount_interval: Option<Decimal>,
}

// ==========================================
// PackagingAmounts - 数量字段组（规范化后）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingAmounts {
    pub is_amount_variable: bool,
    pub default_amount: Decimal,
    pub amount_min: Option<Decimal>,
    pub amount_max: Option<Decimal>,
    pub amount_interval: Option<Decimal>,
}

// ==========================================
// PackagingUnitRow - 导入行（字段映射后）
// ==========================================
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagingUnitRow {
    pub row_number: usize,
    pub concrete_sku: String,
    pub lead_product_sku: String,
    pub type_name: String,
    pub amounts: RawPackagingAmounts,
}

// ==========================================
// PackagingUnitTypeRow - 类型导入行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingUnitTypeRow {
    pub row_number: usize,
    pub name: String,
}

/// 单行写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOutcome {
    Created,
    Updated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_new() {
        let record = PackagingUnitRecord::new_for_product(7);
        assert!(record.is_new());
        assert_eq!(record.product_id, 7);
    }

    #[test]
    fn test_apply_amounts_overwrites_nullable_fields() {
        let mut record = PackagingUnitRecord::new_for_product(7);
        record.amount_min = Some(Decimal::from(3));

        record.apply_amounts(&PackagingAmounts {
            is_amount_variable: false,
            default_amount: Decimal::from(2),
            amount_min: None,
            amount_max: None,
            amount_interval: None,
        });

        assert_eq!(record.default_amount, Decimal::from(2));
        assert_eq!(record.amount_min, None);
    }
}
