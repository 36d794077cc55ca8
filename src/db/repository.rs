use async_trait::async_trait;

use crate::models::{
    Classroom, ClassroomPatch, ClassroomQuery, EntityCounts, NewClassroom, NewSubject, NewTeacher,
    Paged, SchoolSettings, SettingsValues, Subject, SubjectPatch, SubjectQuery, Teacher,
    TeacherPatch, TeacherQuery,
};

/// Storage used by the HTTP handlers.
///
/// Writes are single statements. `update_*` and `delete_*` report whether a row was
/// touched; callers check existence first, so `false` means the row vanished in between.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn ping(&self) -> Result<(), sqlx::Error>;

    async fn list_subjects(&self, query: &SubjectQuery) -> Result<Paged<Subject>, sqlx::Error>;
    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, sqlx::Error>;
    async fn insert_subject(&self, new: NewSubject) -> Result<String, sqlx::Error>;
    async fn update_subject(&self, id: &str, patch: SubjectPatch, updated_at: &str) -> Result<bool, sqlx::Error>;
    async fn delete_subject(&self, id: &str) -> Result<bool, sqlx::Error>;

    async fn list_teachers(&self, query: &TeacherQuery) -> Result<Paged<Teacher>, sqlx::Error>;
    async fn find_teacher(&self, id: &str) -> Result<Option<Teacher>, sqlx::Error>;
    async fn insert_teacher(&self, new: NewTeacher) -> Result<String, sqlx::Error>;
    async fn update_teacher(&self, id: &str, patch: TeacherPatch, updated_at: &str) -> Result<bool, sqlx::Error>;
    async fn delete_teacher(&self, id: &str) -> Result<bool, sqlx::Error>;

    async fn list_classrooms(&self, query: &ClassroomQuery) -> Result<Paged<Classroom>, sqlx::Error>;
    async fn find_classroom(&self, id: &str) -> Result<Option<Classroom>, sqlx::Error>;
    async fn insert_classroom(&self, new: NewClassroom) -> Result<String, sqlx::Error>;
    async fn update_classroom(&self, id: &str, patch: ClassroomPatch, updated_at: &str) -> Result<bool, sqlx::Error>;
    async fn delete_classroom(&self, id: &str) -> Result<bool, sqlx::Error>;

    async fn fetch_settings(&self) -> Result<Option<SchoolSettings>, sqlx::Error>;
    /// Recreates the seeded row if it is missing.
    async fn ensure_settings(&self) -> Result<SchoolSettings, sqlx::Error>;
    async fn update_settings(&self, values: SettingsValues, updated_at: &str) -> Result<bool, sqlx::Error>;
    async fn entity_counts(&self) -> Result<EntityCounts, sqlx::Error>;
}
