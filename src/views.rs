//! Response serialization.
//!
//! Handlers work with the canonical models only. Version 1 is the legacy shape the
//! older admin screens read, carrying every historical field alias at once; version 2
//! is the canonical camelCase model as-is.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::models::{AssignmentRestriction, Classroom, Subject, Teacher};

pub const API_VERSION_HEADER: &str = "x-api-version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" | "v1" => Some(ApiVersion::V1),
            "2" | "v2" => Some(ApiVersion::V2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "1",
            ApiVersion::V2 => "2",
        }
    }
}

/// A canonical model that knows how to present itself for a given API version.
pub trait Render: Serialize {
    /// Key under which list responses carry the items.
    const LIST_KEY: &'static str;

    type Legacy<'a>: Serialize
    where
        Self: 'a;

    fn legacy(&self) -> Self::Legacy<'_>;

    fn render(&self, version: ApiVersion) -> Result<Value, serde_json::Error> {
        match version {
            ApiVersion::V1 => serde_json::to_value(self.legacy()),
            ApiVersion::V2 => serde_json::to_value(self),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySubject<'a> {
    id: &'a str,
    name: &'a str,
    grades: &'a [u8],
    target_grades: &'a [u8],
    #[serde(rename = "target_grades")]
    target_grades_snake: &'a [u8],
    weekly_hours: BTreeMap<String, i64>,
    #[serde(rename = "weekly_hours")]
    weekly_hours_total: i64,
    requires_special_classroom: bool,
    classroom_type: Option<&'a str>,
    #[serde(rename = "special_classroom")]
    special_classroom: &'a str,
    order: i64,
    #[serde(rename = "created_at")]
    created_at_snake: &'a str,
    #[serde(rename = "updated_at")]
    updated_at_snake: &'a str,
    created_at: &'a str,
    updated_at: &'a str,
}

impl Render for Subject {
    const LIST_KEY: &'static str = "subjects";

    type Legacy<'a> = LegacySubject<'a>;

    fn legacy(&self) -> LegacySubject<'_> {
        let special = self.special_classroom.as_deref().unwrap_or("");
        LegacySubject {
            id: &self.id,
            name: &self.name,
            grades: &self.grades,
            target_grades: &self.grades,
            target_grades_snake: &self.grades,
            weekly_hours: self.weekly_hours_by_grade(),
            weekly_hours_total: self.weekly_hours,
            requires_special_classroom: self.requires_special_classroom(),
            classroom_type: (!special.is_empty()).then_some(special),
            special_classroom: special,
            order: self.order,
            created_at_snake: &self.created_at,
            updated_at_snake: &self.updated_at,
            created_at: &self.created_at,
            updated_at: &self.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTeacher<'a> {
    id: &'a str,
    name: &'a str,
    subjects: &'a [String],
    subject_ids: &'a [String],
    grades: &'a [u8],
    target_grades: &'a [u8],
    assignment_restrictions: &'a [AssignmentRestriction],
    #[serde(rename = "assignment_restrictions")]
    assignment_restrictions_snake: &'a [AssignmentRestriction],
    order: i64,
    #[serde(rename = "created_at")]
    created_at_snake: &'a str,
    #[serde(rename = "updated_at")]
    updated_at_snake: &'a str,
    created_at: &'a str,
    updated_at: &'a str,
}

impl Render for Teacher {
    const LIST_KEY: &'static str = "teachers";

    type Legacy<'a> = LegacyTeacher<'a>;

    fn legacy(&self) -> LegacyTeacher<'_> {
        LegacyTeacher {
            id: &self.id,
            name: &self.name,
            subjects: &self.subjects,
            subject_ids: &self.subjects,
            grades: &self.grades,
            target_grades: &self.grades,
            assignment_restrictions: &self.assignment_restrictions,
            assignment_restrictions_snake: &self.assignment_restrictions,
            order: self.order,
            created_at_snake: &self.created_at,
            updated_at_snake: &self.updated_at,
            created_at: &self.created_at,
            updated_at: &self.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyClassroom<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    classroom_type: &'static str,
    #[serde(rename = "classroomType")]
    classroom_type_camel: &'static str,
    capacity: Option<i64>,
    count: i64,
    order: i64,
    #[serde(rename = "created_at")]
    created_at_snake: &'a str,
    #[serde(rename = "updated_at")]
    updated_at_snake: &'a str,
    created_at: &'a str,
    updated_at: &'a str,
}

impl Render for Classroom {
    const LIST_KEY: &'static str = "classrooms";

    type Legacy<'a> = LegacyClassroom<'a>;

    fn legacy(&self) -> LegacyClassroom<'_> {
        LegacyClassroom {
            id: &self.id,
            name: &self.name,
            classroom_type: self.classroom_type.label(),
            classroom_type_camel: self.classroom_type.label(),
            capacity: self.capacity,
            count: self.count,
            order: self.order,
            created_at_snake: &self.created_at,
            updated_at_snake: &self.updated_at,
            created_at: &self.created_at,
            updated_at: &self.updated_at,
        }
    }
}
