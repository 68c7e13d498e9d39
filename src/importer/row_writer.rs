// ==========================================
// 包装单元导入 - 包装单元逐行写入器
// ==========================================
// 流程（单行）:
// 1. 校验具体产品存在销售计量单位
// 2. 规范化数量字段
// 3. 解析类型 ID / 产品 ID / 主产品 ID
// 4. 按产品 ID 查询记录，不存在则新建
// 5. 写入字段并保存（事务由调用方控制）
// 6. 排队发布事件（提交后才分发）
// 红线: 1-3 任一失败则不发生任何写入
// ==========================================

use crate::domain::{PackagingUnitRecord, PackagingUnitRow, ResolverStats, WriteOutcome};
use crate::events::{EventBuffer, PACKAGING_UNIT_PUBLISH};
use crate::importer::error::ImportResult;
use crate::importer::reference_resolver::ReferenceResolver;
use crate::importer::row_normalizer::RowNormalizer;
use crate::repository::{PackagingUnitRepository, ReferenceLookupRepository};
use tracing::debug;

pub struct PackagingUnitWriter<L, R>
where
    L: ReferenceLookupRepository,
    R: PackagingUnitRepository,
{
    resolver: ReferenceResolver<L>,
    repo: R,
    normalizer: RowNormalizer,
}

impl<L, R> PackagingUnitWriter<L, R>
where
    L: ReferenceLookupRepository,
    R: PackagingUnitRepository,
{
    pub fn new(resolver: ReferenceResolver<L>, repo: R) -> Self {
        Self {
            resolver,
            repo,
            normalizer: RowNormalizer::new(),
        }
    }

    /// 写入一行，返回新建/更新
    pub fn write(
        &mut self,
        row: &PackagingUnitRow,
        events: &mut EventBuffer,
    ) -> ImportResult<WriteOutcome> {
        self.resolver
            .assert_has_measurement_sales_unit(&row.concrete_sku)?;

        let amounts = self.normalizer.normalize(&row.amounts, row.row_number)?;

        let packaging_unit_type_id = self
            .resolver
            .resolve_packaging_unit_type_id(&row.type_name)?;
        let product_id = self.resolver.resolve_product_id(&row.concrete_sku)?;
        let lead_product_id = self.resolver.resolve_product_id(&row.lead_product_sku)?;

        let mut record = match self.repo.find_by_product_id(product_id)? {
            Some(existing) => existing,
            None => PackagingUnitRecord::new_for_product(product_id),
        };
        let outcome = if record.is_new() {
            WriteOutcome::Created
        } else {
            WriteOutcome::Updated
        };

        record.lead_product_id = lead_product_id;
        record.packaging_unit_type_id = packaging_unit_type_id;
        record.apply_amounts(&amounts);

        self.repo.save(&mut record)?;

        events.add(PACKAGING_UNIT_PUBLISH, product_id);

        debug!(
            row_number = row.row_number,
            sku = %row.concrete_sku,
            product_id,
            outcome = ?outcome,
            "包装单元写入完成"
        );

        Ok(outcome)
    }

    pub fn stats(&self) -> ResolverStats {
        self.resolver.stats()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}
