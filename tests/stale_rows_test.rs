use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use timetable_backend::db::Repository;
use timetable_backend::models::school_settings::SETTINGS_ID;
use timetable_backend::models::{
    Classroom, ClassroomPatch, ClassroomQuery, ClassroomType, EntityCounts, NewClassroom,
    NewSubject, NewTeacher, PageRequest, Paged, Pagination, SchoolSettings, SettingsValues, Subject,
    SubjectPatch, SubjectQuery, Teacher, TeacherPatch, TeacherQuery,
};
use timetable_backend::{AppState, router};
use tower::ServiceExt;

const STAMP: &str = "2026-04-01T00:00:00.000000Z";

/// Every lookup finds a row, but every write reports that nothing was touched,
/// as when the row is deleted between the existence check and the write.
struct VanishingRows;

fn empty<T>(page: PageRequest) -> Paged<T> {
    Paged {
        items: Vec::new(),
        pagination: Pagination::new(page, 0),
    }
}

#[async_trait]
impl Repository for VanishingRows {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn list_subjects(&self, query: &SubjectQuery) -> Result<Paged<Subject>, sqlx::Error> {
        Ok(empty(query.page))
    }

    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, sqlx::Error> {
        Ok(Some(Subject {
            id: id.to_string(),
            name: "数学".into(),
            grades: vec![1],
            weekly_hours: 4,
            special_classroom: None,
            order: 1,
            created_at: STAMP.into(),
            updated_at: STAMP.into(),
        }))
    }

    async fn insert_subject(&self, _new: NewSubject) -> Result<String, sqlx::Error> {
        Ok("s1".into())
    }

    async fn update_subject(&self, _id: &str, _patch: SubjectPatch, _updated_at: &str) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn delete_subject(&self, _id: &str) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn list_teachers(&self, query: &TeacherQuery) -> Result<Paged<Teacher>, sqlx::Error> {
        Ok(empty(query.page))
    }

    async fn find_teacher(&self, id: &str) -> Result<Option<Teacher>, sqlx::Error> {
        Ok(Some(Teacher {
            id: id.to_string(),
            name: "田中".into(),
            subjects: Vec::new(),
            grades: Vec::new(),
            assignment_restrictions: Vec::new(),
            order: 1,
            created_at: STAMP.into(),
            updated_at: STAMP.into(),
        }))
    }

    async fn insert_teacher(&self, _new: NewTeacher) -> Result<String, sqlx::Error> {
        Ok("t1".into())
    }

    async fn update_teacher(&self, _id: &str, _patch: TeacherPatch, _updated_at: &str) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn delete_teacher(&self, _id: &str) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn list_classrooms(&self, query: &ClassroomQuery) -> Result<Paged<Classroom>, sqlx::Error> {
        Ok(empty(query.page))
    }

    async fn find_classroom(&self, id: &str) -> Result<Option<Classroom>, sqlx::Error> {
        Ok(Some(Classroom {
            id: id.to_string(),
            name: "1-A".into(),
            classroom_type: ClassroomType::General,
            capacity: Some(35),
            count: 1,
            order: 1,
            created_at: STAMP.into(),
            updated_at: STAMP.into(),
        }))
    }

    async fn insert_classroom(&self, _new: NewClassroom) -> Result<String, sqlx::Error> {
        Ok("c1".into())
    }

    async fn update_classroom(&self, _id: &str, _patch: ClassroomPatch, _updated_at: &str) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn delete_classroom(&self, _id: &str) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn fetch_settings(&self) -> Result<Option<SchoolSettings>, sqlx::Error> {
        Ok(Some(SchoolSettings {
            id: SETTINGS_ID.into(),
            grade1_classes: 4,
            grade2_classes: 4,
            grade3_classes: 3,
            daily_periods: 6,
            saturday_periods: 0,
            created_at: STAMP.into(),
            updated_at: STAMP.into(),
        }))
    }

    async fn ensure_settings(&self) -> Result<SchoolSettings, sqlx::Error> {
        self.fetch_settings().await?.ok_or(sqlx::Error::RowNotFound)
    }

    async fn update_settings(&self, _values: SettingsValues, _updated_at: &str) -> Result<bool, sqlx::Error> {
        Ok(false)
    }

    async fn entity_counts(&self) -> Result<EntityCounts, sqlx::Error> {
        Ok(EntityCounts::default())
    }
}

async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = router(AppState::new(Arc::new(VanishingRows)));
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_delete_touching_no_rows_is_delete_failed() {
    for entity in ["subjects", "teachers", "classrooms"] {
        let (status, body) = send(Method::DELETE, &format!("/{}/gone", entity), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", entity);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "DELETE_FAILED");
    }
}

#[tokio::test]
async fn test_update_touching_no_rows_is_not_found() {
    for (entity, code) in [
        ("subjects", "SUBJECT_NOT_FOUND"),
        ("teachers", "TEACHER_NOT_FOUND"),
        ("classrooms", "CLASSROOM_NOT_FOUND"),
    ] {
        let (status, body) = send(Method::PUT, &format!("/{}/gone", entity), Some(json!({"name": "新しい名前"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", entity);
        assert_eq!(body["error"], code);
    }

    let (status, body) = send(
        Method::PUT,
        "/school-settings",
        Some(json!({"grade1Classes": 5, "grade2Classes": 4, "grade3Classes": 3, "dailyPeriods": 6, "saturdayPeriods": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SCHOOL_SETTINGS_NOT_FOUND");
}
