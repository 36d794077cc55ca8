use std::time::{Duration, Instant};

use axum::Router;
use axum::routing::get;
use timetable_backend::client::{ApiClient, ClientConfig, ClientError, ListOptions};
use timetable_backend::db;
use timetable_backend::models::{ClassroomRequest, SettingsValues, SubjectRequest, TeacherRequest};
use timetable_backend::{AppState, router};
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client() -> ApiClient {
    let pool = db::in_memory_pool()
        .await
        .expect("Failed to create database");
    let base_url = serve(router(AppState::sqlite(pool))).await;
    ApiClient::new(ClientConfig::new(base_url)).unwrap()
}

fn subject(name: &str) -> SubjectRequest {
    SubjectRequest {
        name: Some(name.to_string()),
        weekly_hours: Some(serde_json::json!(3)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_crud_through_client() {
    let client = client().await;
    client.health().await.unwrap();

    let created = client.create_subject(&subject("国語")).await.unwrap();
    assert_eq!(created.name, "国語");
    assert_eq!(created.weekly_hours, 3);

    let updated = client
        .update_subject(
            &created.id,
            &SubjectRequest {
                name: Some("現代文".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "現代文");
    assert_eq!(updated.weekly_hours, 3);
    assert!(updated.updated_at > created.updated_at);

    let deleted = client.delete_subject(&created.id).await.unwrap();
    assert_eq!(deleted.deleted_name, "現代文");

    let err = client.get_subject(&created.id).await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status, 404);
            assert_eq!(code, "SUBJECT_NOT_FOUND");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_error_carries_details() {
    let client = client().await;
    let err = client
        .create_teacher(&TeacherRequest {
            name: Some("田中".into()),
            grades: Some(vec![7]),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
    assert_eq!(err.validation_details()[0].path, "grades[0]");
}

#[tokio::test]
async fn test_list_all_walks_every_page() {
    let client = client().await;
    for i in 0..105 {
        client.create_subject(&subject(&format!("教科{:03}", i))).await.unwrap();
    }

    let page = client.list_subjects(&ListOptions::page(2, 50)).await.unwrap();
    assert_eq!(page.items.len(), 50);
    assert_eq!(page.pagination.total, 105);
    assert_eq!(page.pagination.total_pages, 3);

    let all = client.list_all_subjects().await.unwrap();
    assert_eq!(all.len(), 105);
}

#[tokio::test]
async fn test_load_snapshot() {
    let client = client().await;
    client.create_subject(&subject("数学")).await.unwrap();
    client
        .create_teacher(&TeacherRequest {
            name: Some("佐藤".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    client
        .create_classroom(&ClassroomRequest {
            name: Some("音楽室".into()),
            classroom_type: Some("音楽室".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    client
        .update_school_settings(&SettingsValues {
            grade3_classes: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    let snapshot = client.load_snapshot().await.unwrap();
    assert_eq!(snapshot.subjects.len(), 1);
    assert_eq!(snapshot.teachers.len(), 1);
    assert_eq!(snapshot.classrooms.len(), 1);
    assert_eq!(snapshot.settings.settings.grade3_classes, 2);
    assert_eq!(snapshot.settings.statistics.total_teachers, 1);
    assert_eq!(snapshot.settings.statistics.total_classes, 10);
}

#[tokio::test]
async fn test_connection_failure_is_retried_then_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ClientConfig {
        retries: 2,
        retry_delay: Duration::from_millis(50),
        ..ClientConfig::new(format!("http://{}", addr))
    })
    .unwrap();

    let started = Instant::now();
    let err = client.get_school_settings().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "got {:?}", err);
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let slow = Router::new().route(
        "/school-settings",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let base_url = serve(slow).await;
    let client = ApiClient::new(ClientConfig {
        timeout: Duration::from_millis(100),
        ..ClientConfig::new(base_url)
    })
    .unwrap();

    let started = Instant::now();
    let err = client.get_school_settings().await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_unexpected_body_is_invalid_response() {
    let odd = Router::new().route("/subjects/{id}", get(|| async { "not json" }));
    let client = ApiClient::new(ClientConfig::new(serve(odd).await)).unwrap();
    let err = client.get_subject("x").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}
