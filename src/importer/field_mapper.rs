// ==========================================
// 包装单元导入 - 字段映射器
// ==========================================
// 职责: RawRow → 类型化导入行
// 规则: 必填列缺失 → MissingColumn；数值解析失败 → InvalidValue
// ==========================================

use crate::domain::{columns, PackagingUnitRow, PackagingUnitTypeRow, RawPackagingAmounts, RawRow};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    fn required<'a>(&self, row: &'a RawRow, column: &str) -> ImportResult<&'a str> {
        row.get(column).ok_or_else(|| ImportError::MissingColumn {
            row: row.row_number,
            column: column.to_string(),
        })
    }

    /// 必填且非空的文本列
    fn required_text(&self, row: &RawRow, column: &str) -> ImportResult<String> {
        let value = self.required(row, column)?;
        self.cleaner
            .normalize_null(Some(value))
            .ok_or_else(|| ImportError::InvalidValue {
                row: row.row_number,
                field: column.to_string(),
                value: value.to_string(),
                message: "不能为空".to_string(),
            })
    }

    /// 映射包装单元导入行
    pub fn map_packaging_unit(&self, row: &RawRow) -> ImportResult<PackagingUnitRow> {
        // 先整体检查列存在，报告首个缺失列
        for column in columns::REQUIRED {
            self.required(row, column)?;
        }

        let n = row.row_number;
        let amounts = RawPackagingAmounts {
            is_amount_variable: self.required(row, columns::IS_AMOUNT_VARIABLE)?.to_string(),
            default_amount: self.cleaner.parse_decimal(
                self.required(row, columns::DEFAULT_AMOUNT)?,
                columns::DEFAULT_AMOUNT,
                n,
            )?,
            amount_min: self.cleaner.parse_optional_decimal(
                self.required(row, columns::AMOUNT_MIN)?,
                columns::AMOUNT_MIN,
                n,
            )?,
            amount_max: self.cleaner.parse_optional_decimal(
                self.required(row, columns::AMOUNT_MAX)?,
                columns::AMOUNT_MAX,
                n,
            )?,
            amount_interval: self.cleaner.parse_optional_decimal(
                self.required(row, columns::AMOUNT_INTERVAL)?,
                columns::AMOUNT_INTERVAL,
                n,
            )?,
        };

        Ok(PackagingUnitRow {
            row_number: n,
            concrete_sku: self.required_text(row, columns::CONCRETE_SKU)?,
            lead_product_sku: self.required_text(row, columns::LEAD_PRODUCT_SKU)?,
            type_name: self.required_text(row, columns::TYPE_NAME)?,
            amounts,
        })
    }

    /// 映射包装单元类型导入行
    pub fn map_packaging_unit_type(&self, row: &RawRow) -> ImportResult<PackagingUnitTypeRow> {
        Ok(PackagingUnitTypeRow {
            row_number: row.row_number,
            name: self.required_text(row, columns::NAME)?,
        })
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn full_row() -> RawRow {
        RawRow::new(4)
            .with_field(columns::CONCRETE_SKU, "SKU-1")
            .with_field(columns::LEAD_PRODUCT_SKU, "SKU-LEAD")
            .with_field(columns::TYPE_NAME, "box")
            .with_field(columns::IS_AMOUNT_VARIABLE, "1")
            .with_field(columns::DEFAULT_AMOUNT, "2.5")
            .with_field(columns::AMOUNT_MIN, "")
            .with_field(columns::AMOUNT_MAX, "10")
            .with_field(columns::AMOUNT_INTERVAL, "0")
    }

    #[test]
    fn test_map_packaging_unit() {
        let mapped = FieldMapper::new().map_packaging_unit(&full_row()).unwrap();

        assert_eq!(mapped.row_number, 4);
        assert_eq!(mapped.concrete_sku, "SKU-1");
        assert_eq!(mapped.lead_product_sku, "SKU-LEAD");
        assert_eq!(mapped.amounts.is_amount_variable, "1");
        assert_eq!(mapped.amounts.default_amount, Decimal::new(25, 1));
        assert_eq!(mapped.amounts.amount_min, None);
        assert_eq!(mapped.amounts.amount_max, Some(Decimal::from(10)));
        assert_eq!(mapped.amounts.amount_interval, Some(Decimal::ZERO));
    }

    #[test]
    fn test_missing_column() {
        let mut row = full_row();
        row.fields.remove(columns::AMOUNT_MAX);

        let err = FieldMapper::new().map_packaging_unit(&row).unwrap_err();
        match err {
            ImportError::MissingColumn { row, column } => {
                assert_eq!(row, 4);
                assert_eq!(column, columns::AMOUNT_MAX);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_sku_is_invalid() {
        let row = full_row().with_field(columns::CONCRETE_SKU, "  ");
        let err = FieldMapper::new().map_packaging_unit(&row).unwrap_err();
        assert!(matches!(err, ImportError::InvalidValue { .. }));
    }

    #[test]
    fn test_map_packaging_unit_type() {
        let row = RawRow::new(1).with_field(columns::NAME, "pallet");
        let mapped = FieldMapper::new().map_packaging_unit_type(&row).unwrap();
        assert_eq!(mapped.name, "pallet");

        let err = FieldMapper::new()
            .map_packaging_unit_type(&RawRow::new(2))
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn { row: 2, .. }));
    }
}
