// ==========================================
// ImportApi 端到端测试
// ==========================================
// 测试目标: 异步接口、批量并发导入、批次查询
// ==========================================

mod test_helpers;

use packaging_unit_import::api::{ApiError, ImportApi};
use packaging_unit_import::domain::{BatchStatus, ImportKind};
use packaging_unit_import::events::{EventPublisher, PublishEvent};
use packaging_unit_import::logging;
use packaging_unit_import::repository::RepositoryResult;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use test_helpers::*;

#[derive(Default)]
struct CollectingPublisher {
    events: Mutex<Vec<PublishEvent>>,
}

impl EventPublisher for CollectingPublisher {
    fn publish(&self, events: &[PublishEvent], _batch_id: Option<&str>) -> RepositoryResult<usize> {
        self.events.lock().unwrap().extend_from_slice(events);
        Ok(events.len())
    }
}

#[tokio::test]
async fn test_import_types_and_units() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    seed_reference_data(&db_path, 2).unwrap();
    let dir = TempDir::new().unwrap();

    let api = ImportApi::new(&db_path).unwrap();

    let types = write_csv(dir.path(), "types.csv", "NAME", &["bag".to_string()]);
    let response = api
        .import_packaging_unit_types(types.to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(response.import_kind, ImportKind::PackagingUnitType);
    assert_eq!(response.created, 1);
    assert!(response.cache_stats.is_none());

    let units = write_csv(
        dir.path(),
        "units.csv",
        UNIT_HEADER,
        &[
            unit_line("SKU-1", "bag", "1", "0", "", "0"),
            unit_line("SKU-2", "box", "0", "", "", ""),
        ],
    );
    let response = api.import_packaging_units(units.to_str().unwrap()).await.unwrap();
    assert_eq!(response.status, BatchStatus::Completed);
    assert_eq!(response.created, 2);
    assert!(response.cache_stats.is_some());
    assert_eq!(count_rows(&db_path, "publish_event_outbox"), 2);

    let batches = api.list_recent_batches(10).await.unwrap();
    assert_eq!(batches.len(), 2);
}

#[tokio::test]
async fn test_batch_import_runs_files_independently() {
    let (_tmp, db_path) = create_test_db().unwrap();
    seed_reference_data(&db_path, 6).unwrap();
    let dir = TempDir::new().unwrap();

    let publisher = Arc::new(CollectingPublisher::default());
    let api = ImportApi::new(&db_path)
        .unwrap()
        .with_publisher(publisher.clone());

    let a = write_csv(
        dir.path(),
        "a.csv",
        UNIT_HEADER,
        &[
            unit_line("SKU-1", "box", "1", "0", "", "0"),
            unit_line("SKU-2", "box", "1", "0", "", "0"),
            unit_line("SKU-3", "box", "1", "0", "", "0"),
        ],
    );
    let b = write_csv(
        dir.path(),
        "b.csv",
        UNIT_HEADER,
        &[
            unit_line("SKU-4", "pallet", "0", "", "", ""),
            unit_line("SKU-NOUNIT", "pallet", "0", "", "", ""),
        ],
    );
    let missing = dir.path().join("missing.csv");

    let results = api
        .batch_import(
            ImportKind::PackagingUnit,
            vec![
                a.to_string_lossy().to_string(),
                b.to_string_lossy().to_string(),
                missing.to_string_lossy().to_string(),
            ],
        )
        .await;

    assert_eq!(results.len(), 3);

    let first = results[0].as_ref().unwrap();
    assert_eq!(first.status, BatchStatus::Completed);
    assert_eq!(first.created, 3);

    // b.csv 第二行失败（默认 ABORT），第一行单独成事务已提交
    let second = results[1].as_ref().unwrap();
    assert_eq!(second.status, BatchStatus::Aborted);
    assert_eq!(second.success_rows, 1);
    assert_eq!(second.failures[0].row_number, 2);

    assert!(matches!(results[2], Err(ApiError::NotFound(_))));

    assert_eq!(count_rows(&db_path, "product_packaging_unit"), 4);
    assert_eq!(publisher.events.lock().unwrap().len(), 4);
    // 自定义发布者替代 outbox
    assert_eq!(count_rows(&db_path, "publish_event_outbox"), 0);

    let failures = api.list_batch_failures(&second.batch_id).await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error_kind, "ENTITY_NOT_FOUND");
}
