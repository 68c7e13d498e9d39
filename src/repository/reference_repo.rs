// ==========================================
// 包装单元导入 - 引用数据查找 Repository
// ==========================================
// 职责: 按自然键查找代理主键（类型名称 / 产品 SKU）、销售计量单位存在性
// 红线: 只读，不写引用数据
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::lock_connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ReferenceLookupRepository Trait
// ==========================================
// 用途: ReferenceResolver 在缓存未命中时的外部查找
// 实现者: ReferenceRepositoryImpl（使用 rusqlite）
pub trait ReferenceLookupRepository {
    /// 按名称查找包装单元类型 ID
    fn find_packaging_unit_type_id_by_name(&self, name: &str) -> RepositoryResult<Option<i64>>;

    /// 按 SKU 查找产品 ID
    fn find_product_id_by_sku(&self, sku: &str) -> RepositoryResult<Option<i64>>;

    /// 产品是否存在销售计量单位
    fn exists_measurement_sales_unit(&self, product_id: i64) -> RepositoryResult<bool>;
}

// ==========================================
// ReferenceRepositoryImpl
// ==========================================
pub struct ReferenceRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceRepositoryImpl {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl ReferenceLookupRepository for ReferenceRepositoryImpl {
    fn find_packaging_unit_type_id_by_name(&self, name: &str) -> RepositoryResult<Option<i64>> {
        let conn = lock_connection(&self.conn)?;
        let id = conn
            .query_row(
                "SELECT id_product_packaging_unit_type FROM product_packaging_unit_type WHERE name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }

    fn find_product_id_by_sku(&self, sku: &str) -> RepositoryResult<Option<i64>> {
        let conn = lock_connection(&self.conn)?;
        let id = conn
            .query_row(
                "SELECT id_product FROM product WHERE sku = ?1",
                params![sku],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }

    fn exists_measurement_sales_unit(&self, product_id: i64) -> RepositoryResult<bool> {
        let conn = lock_connection(&self.conn)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM product_measurement_sales_unit WHERE fk_product = ?1)",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn setup() -> ReferenceRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO product (id_product, sku) VALUES (1, 'SKU-1'), (2, 'SKU-2');
            INSERT INTO product_packaging_unit_type (id_product_packaging_unit_type, name) VALUES (10, 'box');
            INSERT INTO product_measurement_sales_unit (fk_product) VALUES (1);
            "#,
        )
        .unwrap();
        ReferenceRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_find_by_natural_keys() {
        let repo = setup();
        assert_eq!(repo.find_packaging_unit_type_id_by_name("box").unwrap(), Some(10));
        assert_eq!(repo.find_packaging_unit_type_id_by_name("pallet").unwrap(), None);
        assert_eq!(repo.find_product_id_by_sku("SKU-2").unwrap(), Some(2));
        assert_eq!(repo.find_product_id_by_sku("SKU-9").unwrap(), None);
    }

    #[test]
    fn test_exists_measurement_sales_unit() {
        let repo = setup();
        assert!(repo.exists_measurement_sales_unit(1).unwrap());
        assert!(!repo.exists_measurement_sales_unit(2).unwrap());
    }
}
