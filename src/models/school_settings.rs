use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::Weekday;
use crate::error::AppError;
use crate::validation::{Issues, coerce_int};

pub const SETTINGS_ID: &str = "default";
pub const SETTINGS_GRADES: [u8; 3] = [1, 2, 3];
pub const CLASSES_RANGE: std::ops::RangeInclusive<i64> = 1..=20;
pub const DAILY_PERIODS_RANGE: std::ops::RangeInclusive<i64> = 1..=10;
pub const SATURDAY_PERIODS_RANGE: std::ops::RangeInclusive<i64> = 0..=8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSettings {
    pub id: String,
    pub grade1_classes: i64,
    pub grade2_classes: i64,
    pub grade3_classes: i64,
    pub daily_periods: i64,
    pub saturday_periods: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl SchoolSettings {
    pub fn classes_for(&self, grade: u8) -> i64 {
        match grade {
            1 => self.grade1_classes,
            2 => self.grade2_classes,
            3 => self.grade3_classes,
            _ => 0,
        }
    }
}

/// The five writable settings, always replaced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsValues {
    pub grade1_classes: i64,
    pub grade2_classes: i64,
    pub grade3_classes: i64,
    pub daily_periods: i64,
    pub saturday_periods: i64,
}

impl Default for SettingsValues {
    fn default() -> Self {
        Self {
            grade1_classes: 4,
            grade2_classes: 4,
            grade3_classes: 3,
            daily_periods: 6,
            saturday_periods: 0,
        }
    }
}

struct Field {
    name: &'static str,
    legacy: &'static str,
    range: std::ops::RangeInclusive<i64>,
}

const FIELDS: [Field; 5] = [
    Field { name: "grade1Classes", legacy: "grade1_classes", range: CLASSES_RANGE },
    Field { name: "grade2Classes", legacy: "grade2_classes", range: CLASSES_RANGE },
    Field { name: "grade3Classes", legacy: "grade3_classes", range: CLASSES_RANGE },
    Field { name: "dailyPeriods", legacy: "daily_periods", range: DAILY_PERIODS_RANGE },
    Field { name: "saturdayPeriods", legacy: "saturday_periods", range: SATURDAY_PERIODS_RANGE },
];

impl SettingsValues {
    /// Strict validation first; on failure, falls back to per-field coercion with
    /// defaults so an administrator's save is never rejected for a bad number.
    pub fn from_body(body: &Value) -> Result<Self, AppError> {
        let Value::Object(obj) = body else {
            return Err(AppError::validation("body", "JSONオブジェクトで指定してください"));
        };
        match Self::strict(obj) {
            Ok(values) => Ok(values),
            Err(issues) => {
                warn!(
                    "school settings failed strict validation, applying lenient coercion: {:?}",
                    issues.into_vec()
                );
                Ok(Self::lenient(obj))
            }
        }
    }

    pub fn strict(obj: &Map<String, Value>) -> Result<Self, Issues> {
        let mut issues = Issues::new();
        let mut values = [0i64; 5];
        for (slot, field) in values.iter_mut().zip(FIELDS.iter()) {
            match lookup(obj, field) {
                Some(Value::Number(n)) => match n.as_i64() {
                    Some(v) => {
                        if let Some(v) = issues.int_in(field.name, v, field.range.clone()) {
                            *slot = v;
                        }
                    }
                    None => issues.push(field.name, "整数で指定してください"),
                },
                Some(_) => issues.push(field.name, "整数で指定してください"),
                None => issues.push(field.name, "必須項目です"),
            }
        }
        if issues.is_empty() {
            Ok(Self::from_array(values))
        } else {
            Err(issues)
        }
    }

    pub fn lenient(obj: &Map<String, Value>) -> Self {
        let defaults = Self::default().to_array();
        let mut values = defaults;
        for ((slot, field), default) in values.iter_mut().zip(FIELDS.iter()).zip(defaults) {
            *slot = lookup(obj, field)
                .and_then(coerce_int)
                .filter(|v| field.range.contains(v))
                .unwrap_or(default);
        }
        Self::from_array(values)
    }

    fn to_array(self) -> [i64; 5] {
        [
            self.grade1_classes,
            self.grade2_classes,
            self.grade3_classes,
            self.daily_periods,
            self.saturday_periods,
        ]
    }

    fn from_array(v: [i64; 5]) -> Self {
        Self {
            grade1_classes: v[0],
            grade2_classes: v[1],
            grade3_classes: v[2],
            daily_periods: v[3],
            saturday_periods: v[4],
        }
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, field: &Field) -> Option<&'a Value> {
    obj.get(field.name)
        .or_else(|| obj.get(field.legacy))
        .filter(|v| !v.is_null())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub teachers: i64,
    pub subjects: i64,
    pub classrooms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_teachers: i64,
    pub total_subjects: i64,
    pub total_classrooms: i64,
    pub total_classes: i64,
}

/// Read-only settings view with derived fields and live entity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSettingsView {
    #[serde(flatten)]
    pub settings: SchoolSettings,
    pub days: Vec<Weekday>,
    pub grades: Vec<u8>,
    pub classes_by_grade: BTreeMap<String, Vec<String>>,
    pub statistics: Statistics,
}

impl SchoolSettingsView {
    pub fn new(settings: SchoolSettings, counts: EntityCounts) -> Self {
        let mut days = Weekday::WEEKDAYS.to_vec();
        if settings.saturday_periods > 0 {
            days.push(Weekday::Saturday);
        }

        let classes_by_grade: BTreeMap<String, Vec<String>> = SETTINGS_GRADES
            .iter()
            .map(|g| {
                let labels = (0..settings.classes_for(*g).max(0)).map(class_label).collect();
                (g.to_string(), labels)
            })
            .collect();
        let total_classes = SETTINGS_GRADES.iter().map(|g| settings.classes_for(*g)).sum();

        Self {
            days,
            grades: SETTINGS_GRADES.to_vec(),
            classes_by_grade,
            statistics: Statistics {
                total_teachers: counts.teachers,
                total_subjects: counts.subjects,
                total_classrooms: counts.classrooms,
                total_classes,
            },
            settings,
        }
    }
}

/// `A`, `B`, ... then numbers once the alphabet runs out.
fn class_label(index: i64) -> String {
    if (0..26).contains(&index) {
        char::from(b'A' + index as u8).to_string()
    } else {
        (index + 1).to_string()
    }
}
