use sqlx::FromRow;
use tracing::warn;

use super::codec::{decode_list, decode_list_lossy};
use crate::models::{Classroom, ClassroomType, Subject, Teacher};

#[derive(Debug, Clone, FromRow)]
pub struct SubjectRow {
    pub id: String,
    pub name: String,
    pub target_grades: String,
    pub weekly_hours: i64,
    pub special_classroom: String,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        let mut grades: Vec<u8> = decode_list("target_grades", &row.target_grades);
        grades.retain(|g| (1..=6).contains(g));
        Subject {
            id: row.id,
            name: row.name,
            grades,
            weekly_hours: row.weekly_hours,
            special_classroom: (!row.special_classroom.is_empty()).then_some(row.special_classroom),
            order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TeacherRow {
    pub id: String,
    pub name: String,
    pub subjects: String,
    pub grades: String,
    pub assignment_restrictions: String,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TeacherRow> for Teacher {
    fn from(row: TeacherRow) -> Self {
        let mut grades: Vec<u8> = decode_list("grades", &row.grades);
        grades.retain(|g| (1..=6).contains(g));
        Teacher {
            id: row.id,
            name: row.name,
            subjects: decode_list("subjects", &row.subjects),
            grades,
            assignment_restrictions: decode_list_lossy(
                "assignment_restrictions",
                &row.assignment_restrictions,
            ),
            order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClassroomRow {
    pub id: String,
    pub name: String,
    #[sqlx(rename = "type")]
    pub classroom_type: String,
    pub capacity: Option<i64>,
    pub count: i64,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ClassroomRow> for Classroom {
    fn from(row: ClassroomRow) -> Self {
        let classroom_type = ClassroomType::parse(&row.classroom_type).unwrap_or_else(|| {
            warn!(
                "classroom {} has unknown type {:?}, treating as general",
                row.id, row.classroom_type
            );
            ClassroomType::General
        });
        Classroom {
            id: row.id,
            name: row.name,
            classroom_type,
            capacity: row.capacity,
            count: row.count,
            order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
