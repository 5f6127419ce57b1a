mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use carte::application::catalog::{CreateDishCommand, CreateMenuCommand, CreateSubmenuCommand};
use carte::application::export::{ExportError, ExportService, ExportStatus};
use carte::application::jobs::{ExportJobContext, run_export};
use carte::domain::types::{JobState, JobType};
use carte::infra::http::build_api_router;

use support::{Catalog, FakeJobs, price};

async fn stocked_catalog() -> Catalog {
    let catalog = Catalog::new(false);
    let menu = catalog
        .menus
        .create(CreateMenuCommand {
            title: "Dinner".to_string(),
            description: Some("After six".to_string()),
        })
        .await
        .unwrap();
    let submenu = catalog
        .submenus
        .create(
            menu.id,
            CreateSubmenuCommand {
                title: "Soups".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    catalog
        .dishes
        .create(
            menu.id,
            submenu.id,
            CreateDishCommand {
                title: "Borscht".to_string(),
                description: Some("Beetroot".to_string()),
                price: price("6.50"),
            },
        )
        .await
        .unwrap();
    catalog
}

fn job_context(catalog: &Catalog, directory: &std::path::Path) -> ExportJobContext {
    ExportJobContext {
        catalog: catalog.store.clone(),
        directory: directory.to_path_buf(),
    }
}

fn queued_file_name(jobs: &FakeJobs, task_id: &str) -> String {
    let job = jobs.job(task_id).expect("job should be queued");
    job.payload["file_name"]
        .as_str()
        .expect("payload carries a file name")
        .to_string()
}

#[tokio::test]
async fn run_export_writes_a_workbook() {
    let catalog = stocked_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let exports = dir.path().join("task_files");

    let path = run_export(&job_context(&catalog, &exports), "menu.xlsx")
        .await
        .unwrap();

    assert_eq!(path, exports.join("menu.xlsx"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"PK"), "xlsx files are zip archives");

    let leftovers: Vec<_> = std::fs::read_dir(&exports)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[tokio::test]
async fn run_export_refuses_paths_outside_the_directory() {
    let catalog = stocked_catalog().await;
    let dir = tempfile::tempdir().unwrap();

    let err = run_export(&job_context(&catalog, dir.path()), "../escape.xlsx")
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Payload(_)));
}

#[tokio::test]
async fn submit_then_poll_follows_the_job_state() {
    let catalog = stocked_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let jobs = Arc::new(FakeJobs::default());
    let service = ExportService::new(jobs.clone(), dir.path().to_path_buf());

    let task_id = service.submit().await.unwrap();
    let job = jobs.job(&task_id).unwrap();
    assert_eq!(job.job_type, JobType::ExportMenus);
    assert_eq!(job.max_attempts, 3);
    let file_name = queued_file_name(&jobs, &task_id);
    assert!(file_name.ends_with("_menu.xlsx"));

    assert_eq!(
        service.poll(&task_id).await.unwrap(),
        ExportStatus::Pending {
            state: JobState::Pending
        }
    );

    run_export(&job_context(&catalog, dir.path()), &file_name)
        .await
        .unwrap();
    jobs.set_state(&task_id, JobState::Done, None);

    match service.poll(&task_id).await.unwrap() {
        ExportStatus::Ready {
            file_name: ready,
            path,
        } => {
            assert_eq!(ready, file_name);
            assert!(path.exists());
        }
        other => panic!("expected a ready export, got {other:?}"),
    }
}

#[tokio::test]
async fn poll_reports_failures_and_unknown_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let jobs = Arc::new(FakeJobs::default());
    let service = ExportService::new(jobs.clone(), dir.path().to_path_buf());

    let task_id = service.submit().await.unwrap();
    jobs.set_state(&task_id, JobState::Failed, Some("disk full"));

    assert_eq!(
        service.poll(&task_id).await.unwrap(),
        ExportStatus::Failed {
            message: "disk full".to_string()
        }
    );
    assert!(matches!(
        service.poll("missing").await,
        Err(ExportError::NotFound)
    ));
}

#[tokio::test]
async fn export_endpoints_serve_the_finished_file() {
    let catalog = stocked_catalog().await;
    let dir = tempfile::tempdir().unwrap();
    let jobs = Arc::new(FakeJobs::default());
    let router = build_api_router(catalog.api_state(jobs.clone(), dir.path().to_path_buf()));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/exports")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let poll = || {
        router.clone().oneshot(
            Request::builder()
                .uri(format!("/api/v1/exports/{task_id}"))
                .body(Body::empty())
                .unwrap(),
        )
    };

    let response = poll().await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["task_id"], task_id.as_str());

    let file_name = queued_file_name(&jobs, &task_id);
    run_export(&job_context(&catalog, dir.path()), &file_name)
        .await
        .unwrap();
    jobs.set_state(&task_id, JobState::Done, None);

    let response = poll().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&file_name));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"PK"));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/exports/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_export_is_a_server_error() {
    let catalog = Catalog::new(false);
    let dir = tempfile::tempdir().unwrap();
    let jobs = Arc::new(FakeJobs::default());
    let service = ExportService::new(jobs.clone(), dir.path().to_path_buf());
    let task_id = service.submit().await.unwrap();
    jobs.set_state(&task_id, JobState::Killed, None);

    let router = build_api_router(catalog.api_state(jobs, dir.path().to_path_buf()));
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/exports/{task_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "export_failed");
}
