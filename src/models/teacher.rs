use serde::{Deserialize, Serialize};

use super::Weekday;
use crate::error::AppError;
use crate::validation::{Issues, ORDER_RANGE, lenient_int, lenient_int_list, lenient_string_list};

pub const PERIOD_RANGE: std::ops::RangeInclusive<i64> = 1..=10;
const REASON_MAX_CHARS: usize = 200;
const MAX_SUBJECT_REFS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestrictionLevel {
    #[serde(rename = "required", alias = "必須")]
    Required,
    #[serde(rename = "recommended", alias = "推奨")]
    Recommended,
}

impl RestrictionLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "required" | "必須" => Some(RestrictionLevel::Required),
            "recommended" | "推奨" => Some(RestrictionLevel::Recommended),
            _ => None,
        }
    }
}

/// A day/period slot the teacher should not (or must not) be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRestriction {
    pub restricted_day: Weekday,
    pub restricted_periods: Vec<u8>,
    pub restriction_level: RestrictionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    /// Subject ids; not checked against the subjects table.
    pub subjects: Vec<String>,
    pub grades: Vec<u8>,
    pub assignment_restrictions: Vec<AssignmentRestriction>,
    pub order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeacher {
    pub name: String,
    pub subjects: Vec<String>,
    pub grades: Vec<u8>,
    pub assignment_restrictions: Vec<AssignmentRestriction>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherPatch {
    pub name: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub grades: Option<Vec<u8>>,
    pub assignment_restrictions: Option<Vec<AssignmentRestriction>>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionInput {
    #[serde(default, alias = "day", alias = "restricted_day", skip_serializing_if = "Option::is_none")]
    pub restricted_day: Option<String>,
    #[serde(
        default,
        alias = "periods",
        alias = "restricted_periods",
        deserialize_with = "lenient_int_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub restricted_periods: Option<Vec<i64>>,
    #[serde(
        default,
        alias = "level",
        alias = "restriction_level",
        skip_serializing_if = "Option::is_none"
    )]
    pub restriction_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&AssignmentRestriction> for RestrictionInput {
    fn from(r: &AssignmentRestriction) -> Self {
        Self {
            restricted_day: Some(r.restricted_day.label().to_string()),
            restricted_periods: Some(r.restricted_periods.iter().map(|p| *p as i64).collect()),
            restriction_level: Some(
                match r.restriction_level {
                    RestrictionLevel::Required => "required",
                    RestrictionLevel::Recommended => "recommended",
                }
                .to_string(),
            ),
            reason: r.reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "subjectIds",
        alias = "subject_ids",
        deserialize_with = "lenient_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub subjects: Option<Vec<String>>,
    #[serde(
        default,
        alias = "targetGrades",
        alias = "target_grades",
        deserialize_with = "lenient_int_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub grades: Option<Vec<i64>>,
    #[serde(
        default,
        alias = "restrictions",
        alias = "assignment_restrictions",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignment_restrictions: Option<Vec<RestrictionInput>>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

pub type CreateTeacherRequest = TeacherRequest;
pub type UpdateTeacherRequest = TeacherRequest;

impl TeacherRequest {
    pub fn validate_create(&self) -> Result<NewTeacher, AppError> {
        let mut issues = Issues::new();
        let name = issues.required_name("name", self.name.as_deref());
        let patch = self.fields(&mut issues);
        issues.finish(NewTeacher {
            name: name.unwrap_or_default(),
            subjects: patch.subjects.unwrap_or_default(),
            grades: patch.grades.unwrap_or_default(),
            assignment_restrictions: patch.assignment_restrictions.unwrap_or_default(),
            order: patch.order,
        })
    }

    pub fn validate_update(&self) -> Result<TeacherPatch, AppError> {
        let mut issues = Issues::new();
        let name = self.name.as_deref().and_then(|n| issues.name("name", n));
        let patch = self.fields(&mut issues);
        issues.finish(TeacherPatch { name, ..patch })
    }

    fn fields(&self, issues: &mut Issues) -> TeacherPatch {
        let subjects = self.subjects.as_ref().map(|ids| subject_refs(issues, ids));
        let grades = self.grades.as_ref().map(|g| issues.grades("grades", g));
        let assignment_restrictions = self.assignment_restrictions.as_ref().map(|list| {
            list.iter()
                .enumerate()
                .filter_map(|(i, r)| restriction(issues, &format!("assignmentRestrictions[{}]", i), r))
                .collect()
        });
        let order = self.order.and_then(|o| issues.int_in("order", o, ORDER_RANGE));
        TeacherPatch {
            name: None,
            subjects,
            grades,
            assignment_restrictions,
            order,
        }
    }
}

fn subject_refs(issues: &mut Issues, ids: &[String]) -> Vec<String> {
    if ids.len() > MAX_SUBJECT_REFS {
        issues.push("subjects", format!("{}件以内で指定してください", MAX_SUBJECT_REFS));
        return Vec::new();
    }
    let mut refs: Vec<String> = Vec::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        let id = id.trim();
        if crate::validation::validate_id(id).is_err() {
            issues.push(format!("subjects[{}]", i), "IDの形式が不正です");
        } else if !refs.iter().any(|r| r == id) {
            refs.push(id.to_string());
        }
    }
    refs
}

fn restriction(issues: &mut Issues, path: &str, input: &RestrictionInput) -> Option<AssignmentRestriction> {
    let day = match input.restricted_day.as_deref() {
        Some(raw) => {
            let parsed = serde_json::from_value::<Weekday>(serde_json::Value::String(raw.trim().to_string())).ok();
            if parsed.is_none() {
                issues.push(format!("{}.restrictedDay", path), "曜日は月曜から土曜で指定してください");
            }
            parsed
        }
        None => {
            issues.push(format!("{}.restrictedDay", path), "必須項目です");
            None
        }
    };

    let periods = match input.restricted_periods.as_deref() {
        Some([]) | None => {
            issues.push(format!("{}.restrictedPeriods", path), "1つ以上の時限を指定してください");
            None
        }
        Some(raw) => {
            let mut periods = Vec::with_capacity(raw.len());
            let mut ok = true;
            for (i, p) in raw.iter().enumerate() {
                match issues.int_in(&format!("{}.restrictedPeriods[{}]", path, i), *p, PERIOD_RANGE) {
                    Some(p) => periods.push(p as u8),
                    None => ok = false,
                }
            }
            periods.sort_unstable();
            periods.dedup();
            ok.then_some(periods)
        }
    };

    let level = match input.restriction_level.as_deref() {
        Some(raw) => {
            let parsed = RestrictionLevel::parse(raw);
            if parsed.is_none() {
                issues.push(
                    format!("{}.restrictionLevel", path),
                    "required または recommended を指定してください",
                );
            }
            parsed
        }
        None => Some(RestrictionLevel::Required),
    };

    let reason = match input.reason.as_deref().map(str::trim) {
        Some(r) if r.chars().count() > REASON_MAX_CHARS => {
            issues.push(format!("{}.reason", path), format!("{}文字以内で入力してください", REASON_MAX_CHARS));
            None
        }
        Some(r) if !r.is_empty() => Some(r.to_string()),
        _ => None,
    };

    Some(AssignmentRestriction {
        restricted_day: day?,
        restricted_periods: periods?,
        restriction_level: level?,
        reason,
    })
}
