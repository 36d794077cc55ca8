use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::validation::{GRADE_RANGE, Issues, ORDER_RANGE, coerce_int, lenient_int, lenient_int_list};

pub const WEEKLY_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=10;
pub const DEFAULT_WEEKLY_HOURS: i64 = 1;
/// Grades a subject with no explicit grade list is offered to.
pub const STANDARD_GRADES: [u8; 3] = [1, 2, 3];
pub const GENERAL_CLASSROOM: &str = "普通教室";
/// Stored when a special room is required but no type was named.
pub const SPECIAL_CLASSROOM_SENTINEL: &str = "特別教室";
const CLASSROOM_TYPE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    /// Empty means every grade.
    pub grades: Vec<u8>,
    pub weekly_hours: i64,
    pub special_classroom: Option<String>,
    pub order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Subject {
    pub fn requires_special_classroom(&self) -> bool {
        self.special_classroom
            .as_deref()
            .is_some_and(|t| !t.is_empty() && t != GENERAL_CLASSROOM)
    }

    /// Expands the single stored value over the subject's grades.
    pub fn weekly_hours_by_grade(&self) -> BTreeMap<String, i64> {
        let grades: &[u8] = if self.grades.is_empty() {
            &STANDARD_GRADES
        } else {
            &self.grades
        };
        grades
            .iter()
            .map(|g| (g.to_string(), self.weekly_hours))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubject {
    pub name: String,
    pub grades: Vec<u8>,
    pub weekly_hours: i64,
    pub special_classroom: String,
    pub order: Option<i64>,
}

/// Columns to overwrite; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub grades: Option<Vec<u8>>,
    pub weekly_hours: Option<i64>,
    pub special_classroom: Option<String>,
    pub order: Option<i64>,
}

/// Request body for both create and partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "targetGrades",
        alias = "target_grades",
        deserialize_with = "lenient_int_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub grades: Option<Vec<i64>>,
    /// Either a number or a per-grade map such as `{"1": 5}`.
    #[serde(default, alias = "weekly_hours", skip_serializing_if = "Option::is_none")]
    pub weekly_hours: Option<Value>,
    #[serde(
        default,
        alias = "requires_special_classroom",
        skip_serializing_if = "Option::is_none"
    )]
    pub requires_special_classroom: Option<bool>,
    #[serde(
        default,
        alias = "classroom_type",
        alias = "specialClassroom",
        alias = "special_classroom",
        skip_serializing_if = "Option::is_none"
    )]
    pub classroom_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

pub type CreateSubjectRequest = SubjectRequest;
pub type UpdateSubjectRequest = SubjectRequest;

enum WeeklyHours {
    Uniform(i64),
    PerGrade(BTreeMap<u8, i64>),
}

impl WeeklyHours {
    /// The persisted form keeps only one number: the lowest grade's value.
    fn collapse(&self) -> i64 {
        match self {
            WeeklyHours::Uniform(hours) => *hours,
            WeeklyHours::PerGrade(map) => map.values().next().copied().unwrap_or(DEFAULT_WEEKLY_HOURS),
        }
    }

    fn grades(&self) -> Vec<u8> {
        match self {
            WeeklyHours::Uniform(_) => Vec::new(),
            WeeklyHours::PerGrade(map) => map.keys().copied().collect(),
        }
    }
}

impl SubjectRequest {
    pub fn validate_create(&self) -> Result<NewSubject, AppError> {
        let mut issues = Issues::new();
        let name = issues.required_name("name", self.name.as_deref());
        let (grades, weekly) = self.grades_and_hours(&mut issues);
        let special = resolve_special_classroom(
            self.requires_special_classroom,
            self.classroom_type(&mut issues),
            "",
        );
        let order = self.order(&mut issues);

        let weekly_hours = weekly.as_ref().map_or(DEFAULT_WEEKLY_HOURS, WeeklyHours::collapse);
        let grades = match (grades, &weekly) {
            (Some(g), _) if !g.is_empty() => g,
            (_, Some(w)) => w.grades(),
            (g, None) => g.unwrap_or_default(),
        };

        issues.finish(())?;
        Ok(NewSubject {
            name: name.unwrap_or_default(),
            grades,
            weekly_hours,
            special_classroom: special.unwrap_or_default(),
            order,
        })
    }

    /// Checks the body without the stored row; see [`SubjectUpdate::resolve`].
    pub fn validate_update(&self) -> Result<SubjectUpdate, AppError> {
        let mut issues = Issues::new();
        let name = self.name.as_deref().and_then(|n| issues.name("name", n));
        let (grades, weekly) = self.grades_and_hours(&mut issues);
        let classroom_type = self.classroom_type(&mut issues).map(str::to_string);
        let order = self.order(&mut issues);

        let grades = match (grades, &weekly) {
            (Some(g), _) => Some(g),
            (None, Some(w @ WeeklyHours::PerGrade(_))) => Some(w.grades()),
            (None, _) => None,
        };

        issues.finish(SubjectUpdate {
            patch: SubjectPatch {
                name,
                grades,
                weekly_hours: weekly.as_ref().map(WeeklyHours::collapse),
                special_classroom: None,
                order,
            },
            requires_special_classroom: self.requires_special_classroom,
            classroom_type,
        })
    }

    fn grades_and_hours(&self, issues: &mut Issues) -> (Option<Vec<u8>>, Option<WeeklyHours>) {
        let grades = self.grades.as_ref().map(|g| issues.grades("grades", g));
        let weekly = self
            .weekly_hours
            .as_ref()
            .and_then(|value| parse_weekly_hours(issues, value));
        (grades, weekly)
    }

    fn classroom_type(&self, issues: &mut Issues) -> Option<&str> {
        let classroom_type = self.classroom_type.as_deref().map(str::trim);
        if let Some(t) = classroom_type {
            if t.chars().count() > CLASSROOM_TYPE_MAX_CHARS {
                issues.push(
                    "classroomType",
                    format!("{}文字以内で入力してください", CLASSROOM_TYPE_MAX_CHARS),
                );
            }
        }
        classroom_type
    }

    fn order(&self, issues: &mut Issues) -> Option<i64> {
        self.order.and_then(|o| issues.int_in("order", o, ORDER_RANGE))
    }
}

/// A validated subject update still waiting on the stored special classroom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectUpdate {
    patch: SubjectPatch,
    requires_special_classroom: Option<bool>,
    classroom_type: Option<String>,
}

impl SubjectUpdate {
    pub fn resolve(self, existing: &Subject) -> SubjectPatch {
        let current = existing.special_classroom.as_deref().unwrap_or("");
        SubjectPatch {
            special_classroom: resolve_special_classroom(
                self.requires_special_classroom,
                self.classroom_type.as_deref(),
                current,
            ),
            ..self.patch
        }
    }
}

/// Works out the new `special_classroom` column; `None` means keep `current`.
fn resolve_special_classroom(
    requires: Option<bool>,
    classroom_type: Option<&str>,
    current: &str,
) -> Option<String> {
    match (requires, classroom_type) {
        (Some(false), _) => Some(String::new()),
        (_, Some(t)) if !t.is_empty() => Some(t.to_string()),
        (Some(true), _) if current.is_empty() || current == GENERAL_CLASSROOM => {
            Some(SPECIAL_CLASSROOM_SENTINEL.to_string())
        }
        (Some(true), _) => None,
        (None, Some(_)) => Some(String::new()),
        (None, None) => None,
    }
}

fn parse_weekly_hours(issues: &mut Issues, value: &Value) -> Option<WeeklyHours> {
    match value {
        Value::Object(map) => {
            let mut per_grade = BTreeMap::new();
            for (key, hours) in map {
                let path = format!("weeklyHours.{}", key);
                let grade = match key.trim().parse::<i64>() {
                    Ok(g) => issues.int_in(&path, g, GRADE_RANGE),
                    Err(_) => {
                        issues.push(&path, "学年は1から6の整数で指定してください");
                        None
                    }
                };
                let hours = match coerce_int(hours) {
                    Some(h) => issues.int_in(&path, h, WEEKLY_HOURS_RANGE),
                    None => {
                        issues.push(&path, "整数で指定してください");
                        None
                    }
                };
                if let (Some(g), Some(h)) = (grade, hours) {
                    per_grade.insert(g as u8, h);
                }
            }
            if map.is_empty() {
                issues.push("weeklyHours", "学年ごとの時数を1つ以上指定してください");
            }
            (!per_grade.is_empty()).then_some(WeeklyHours::PerGrade(per_grade))
        }
        other => match coerce_int(other) {
            Some(h) => issues
                .int_in("weeklyHours", h, WEEKLY_HOURS_RANGE)
                .map(WeeklyHours::Uniform),
            None => {
                issues.push("weeklyHours", "整数または学年ごとの時数で指定してください");
                None
            }
        },
    }
}
