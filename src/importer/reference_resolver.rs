// ==========================================
// 包装单元导入 - 引用解析器
// ==========================================
// 职责: 自然键 → 代理主键解析，每类引用独立一个有界缓存
// - 包装单元类型: name → id
// - 产品: sku → id
// - 销售计量单位: sku → 是否存在（校验门，不返回值）
// 失败策略: 未找到即返回 EntityNotFound，不重试、不默认
// 生命周期: 每次导入运行新建一个实例
// ==========================================

use crate::domain::ResolverStats;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::lookup_cache::{LookupCache, DEFAULT_CACHE_CAPACITY};
use crate::repository::ReferenceLookupRepository;
use tracing::trace;

pub const ENTITY_PACKAGING_UNIT_TYPE: &str = "包装单元类型";
pub const ENTITY_PRODUCT: &str = "产品";
pub const ENTITY_MEASUREMENT_SALES_UNIT: &str = "销售计量单位";

pub struct ReferenceResolver<L>
where
    L: ReferenceLookupRepository,
{
    lookup: L,
    packaging_unit_types: LookupCache<String, i64>,
    products: LookupCache<String, i64>,
    measurement_sales_units: LookupCache<String, bool>,
}

impl<L> ReferenceResolver<L>
where
    L: ReferenceLookupRepository,
{
    pub fn new(lookup: L) -> Self {
        Self::with_capacity(lookup, DEFAULT_CACHE_CAPACITY)
    }

    /// 指定每个缓存的容量
    pub fn with_capacity(lookup: L, capacity: usize) -> Self {
        Self {
            lookup,
            packaging_unit_types: LookupCache::new(capacity),
            products: LookupCache::new(capacity),
            measurement_sales_units: LookupCache::new(capacity),
        }
    }

    /// 按名称解析包装单元类型 ID
    pub fn resolve_packaging_unit_type_id(&mut self, name: &str) -> ImportResult<i64> {
        let lookup = &self.lookup;
        self.packaging_unit_types
            .get_or_try_insert_with(name.to_string(), |name| {
                trace!(name = %name, "查询包装单元类型");
                lookup
                    .find_packaging_unit_type_id_by_name(name)?
                    .ok_or_else(|| ImportError::entity_not_found(ENTITY_PACKAGING_UNIT_TYPE, name))
            })
    }

    /// 按 SKU 解析产品 ID
    pub fn resolve_product_id(&mut self, sku: &str) -> ImportResult<i64> {
        resolve_product(&self.lookup, &mut self.products, sku)
    }

    /// 校验产品存在销售计量单位
    ///
    /// 未命中时先解析产品 ID（写入产品缓存），再查询存在性，
    /// 结果（含 false）按 SKU 缓存。
    pub fn assert_has_measurement_sales_unit(&mut self, sku: &str) -> ImportResult<()> {
        let cached = self.measurement_sales_units.get(sku).copied();
        let has_unit = match cached {
            Some(flag) => flag,
            None => {
                let product_id = resolve_product(&self.lookup, &mut self.products, sku)?;
                trace!(sku = %sku, product_id, "查询销售计量单位");
                let flag = self.lookup.exists_measurement_sales_unit(product_id)?;
                self.measurement_sales_units.put(sku.to_string(), flag);
                flag
            }
        };

        if has_unit {
            Ok(())
        } else {
            Err(ImportError::entity_not_found(ENTITY_MEASUREMENT_SALES_UNIT, sku))
        }
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            packaging_unit_type: self.packaging_unit_types.stats(),
            product: self.products.stats(),
            measurement_sales_unit: self.measurement_sales_units.stats(),
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}

fn resolve_product<L: ReferenceLookupRepository>(
    lookup: &L,
    products: &mut LookupCache<String, i64>,
    sku: &str,
) -> ImportResult<i64> {
    products.get_or_try_insert_with(sku.to_string(), |sku| {
        trace!(sku = %sku, "查询产品");
        lookup
            .find_product_id_by_sku(sku)?
            .ok_or_else(|| ImportError::entity_not_found(ENTITY_PRODUCT, sku))
    })
}
