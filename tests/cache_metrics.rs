mod support;

use std::collections::HashSet;
use std::sync::Arc;

use apalis::prelude::Data;
use metrics_util::debugging::DebuggingRecorder;

use carte::application::catalog::CreateMenuCommand;
use carte::application::jobs::{ExportJobContext, ExportMenusJobPayload, process_export_menus_job};
use carte::cache::{Cache, CacheConfig, CacheGateway, CacheKey, MemoryCache};
use carte::infra::telemetry;

use support::Catalog;

#[tokio::test]
async fn cache_and_export_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    // hit, miss, invalidate
    let catalog = Catalog::new(false);
    catalog
        .menus
        .create(CreateMenuCommand {
            title: "Lunch".to_string(),
            description: None,
        })
        .await
        .unwrap();
    catalog.menus.list().await.unwrap();
    catalog.menus.list().await.unwrap();

    // lookup error
    catalog.cache.fail_reads(true);
    catalog.menus.get(1).await.unwrap();
    catalog.cache.fail_reads(false);

    // eviction
    let tiny = CacheConfig {
        entry_limit: 1,
        ..Default::default()
    };
    let memory = Arc::new(MemoryCache::new(&tiny));
    let gateway = CacheGateway::new(memory.clone(), &tiny);
    for menu_id in 1..=2 {
        let _: Result<i64, ()> = gateway
            .read_through(CacheKey::Menu { menu_id }, || async move { Ok(menu_id) })
            .await;
    }
    assert_eq!(memory.len(), 1);
    assert!(memory.get("menu_2").await.unwrap().is_some());

    // export outcomes
    let dir = tempfile::tempdir().unwrap();
    let context = Data::new(ExportJobContext {
        catalog: catalog.store.clone(),
        directory: dir.path().to_path_buf(),
    });
    process_export_menus_job(
        ExportMenusJobPayload {
            file_name: "menu.xlsx".to_string(),
        },
        context.clone(),
    )
    .await
    .unwrap();
    assert!(
        process_export_menus_job(
            ExportMenusJobPayload {
                file_name: "../menu.xlsx".to_string(),
            },
            context,
        )
        .await
        .is_err()
    );

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "carte_cache_hit_total",
        "carte_cache_miss_total",
        "carte_cache_error_total",
        "carte_cache_evict_total",
        "carte_cache_invalidate_ms",
        "carte_export_jobs_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
