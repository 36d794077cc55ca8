pub mod classroom;
pub mod filters;
pub mod listing;
pub mod school_settings;
pub mod subject;
pub mod teacher;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub use classroom::{Classroom, ClassroomPatch, ClassroomRequest, ClassroomType, CreateClassroomRequest, NewClassroom, UpdateClassroomRequest};
pub use filters::{ClassroomFilter, ClassroomListParams, ClassroomQuery, ClassroomSort, SubjectFilter, SubjectListParams, SubjectQuery, SubjectSort, TeacherFilter, TeacherListParams, TeacherQuery, TeacherSort};
pub use listing::{ListQuery, PageRequest, Paged, Pagination, SortOrder};
pub use school_settings::{EntityCounts, SchoolSettings, SchoolSettingsView, SettingsValues};
pub use subject::{CreateSubjectRequest, NewSubject, Subject, SubjectPatch, SubjectRequest, SubjectUpdate, UpdateSubjectRequest};
pub use teacher::{AssignmentRestriction, CreateTeacherRequest, NewTeacher, RestrictionInput, RestrictionLevel, Teacher, TeacherPatch, TeacherRequest, UpdateTeacherRequest};

/// The persisted administrative records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Subject,
    Teacher,
    Classroom,
    SchoolSettings,
}

impl Entity {
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Entity::Subject => "SUBJECT",
            Entity::Teacher => "TEACHER",
            Entity::Classroom => "CLASSROOM",
            Entity::SchoolSettings => "SCHOOL_SETTINGS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Entity::Subject => "教科",
            Entity::Teacher => "教師",
            Entity::Classroom => "教室",
            Entity::SchoolSettings => "学校設定",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "月曜", alias = "月")]
    Monday,
    #[serde(rename = "火曜", alias = "火")]
    Tuesday,
    #[serde(rename = "水曜", alias = "水")]
    Wednesday,
    #[serde(rename = "木曜", alias = "木")]
    Thursday,
    #[serde(rename = "金曜", alias = "金")]
    Friday,
    #[serde(rename = "土曜", alias = "土")]
    Saturday,
}

impl Weekday {
    pub const WEEKDAYS: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "月曜",
            Weekday::Tuesday => "火曜",
            Weekday::Wednesday => "水曜",
            Weekday::Thursday => "木曜",
            Weekday::Friday => "金曜",
            Weekday::Saturday => "土曜",
        }
    }
}

pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// A timestamp strictly later than `previous`, even when the clock has not moved.
pub fn next_timestamp(previous: &str) -> String {
    let now = Utc::now();
    match DateTime::parse_from_rfc3339(previous) {
        Ok(prev) => {
            let prev = prev.with_timezone(&Utc);
            if now > prev {
                format_timestamp(now)
            } else {
                format_timestamp(prev + Duration::microseconds(1))
            }
        }
        Err(_) => format_timestamp(now),
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_timestamp_is_strictly_later() {
        let future = format_timestamp(Utc::now() + Duration::seconds(60));
        let next = next_timestamp(&future);
        assert!(next > future);

        let past = "2020-01-01T00:00:00.000000Z";
        assert!(next_timestamp(past).as_str() > past);
    }

    #[test]
    fn test_next_timestamp_tolerates_garbage() {
        assert!(DateTime::parse_from_rfc3339(&next_timestamp("yesterday")).is_ok());
    }
}
