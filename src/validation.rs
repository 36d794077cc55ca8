use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub const GRADE_RANGE: std::ops::RangeInclusive<i64> = 1..=6;
pub const NAME_MAX_CHARS: usize = 100;
pub const ORDER_RANGE: std::ops::RangeInclusive<i64> = 0..=9999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

/// Collects every problem in a request so a single 400 can list them all.
#[derive(Debug, Default)]
pub struct Issues(Vec<ValidationIssue>);

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.0
    }

    /// Returns `value` when nothing was recorded, otherwise the collected issues.
    pub fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.0))
        }
    }

    pub fn required_name(&mut self, path: &str, raw: Option<&str>) -> Option<String> {
        match raw {
            Some(name) => self.name(path, name),
            None => {
                self.push(path, "必須項目です");
                None
            }
        }
    }

    pub fn name(&mut self, path: &str, raw: &str) -> Option<String> {
        let name = raw.trim();
        let len = name.chars().count();
        if len == 0 {
            self.push(path, "空にできません");
            None
        } else if len > NAME_MAX_CHARS {
            self.push(path, format!("{}文字以内で入力してください", NAME_MAX_CHARS));
            None
        } else {
            Some(name.to_string())
        }
    }

    pub fn int_in(
        &mut self,
        path: &str,
        value: i64,
        range: std::ops::RangeInclusive<i64>,
    ) -> Option<i64> {
        if range.contains(&value) {
            Some(value)
        } else {
            self.push(
                path,
                format!("{}から{}の範囲で指定してください", range.start(), range.end()),
            );
            None
        }
    }

    /// Validates, sorts and deduplicates a grade list.
    pub fn grades(&mut self, path: &str, raw: &[i64]) -> Vec<u8> {
        let mut grades = Vec::with_capacity(raw.len());
        for (i, grade) in raw.iter().enumerate() {
            if let Some(g) = self.int_in(&format!("{}[{}]", path, i), *grade, GRADE_RANGE) {
                grades.push(g as u8);
            }
        }
        grades.sort_unstable();
        grades.dedup();
        grades
    }
}

pub fn validate_id(id: &str) -> Result<(), AppError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(vec![ValidationIssue {
            path: "id".to_string(),
            message: "IDの形式が不正です".to_string(),
        }]))
    }
}

/// Reads an integer from a JSON number or a numeric string.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_int_list(value: Value) -> Result<Vec<i64>, String> {
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => items,
            _ => return Err(format!("expected an array of integers, got {:?}", s)),
        },
        other => return Err(format!("expected an array of integers, got {}", other)),
    };
    items
        .iter()
        .map(|item| coerce_int(item).ok_or_else(|| format!("expected an integer, got {}", item)))
        .collect()
}

fn coerce_string_list(value: Value) -> Result<Vec<String>, String> {
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => items,
            _ => return Err(format!("expected an array of strings, got {:?}", s)),
        },
        other => return Err(format!("expected an array of strings, got {}", other)),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            Value::Object(mut obj) => match obj.remove("id") {
                Some(Value::String(id)) => Ok(id),
                _ => Err("expected an object with a string id".to_string()),
            },
            other => Err(format!("expected a string, got {}", other)),
        })
        .collect()
}

/// `deserialize_with` helper: optional integer given as a number or numeric string.
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_int(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", value))),
    }
}

/// `deserialize_with` helper: optional integer list, also accepted as a JSON-encoded string.
pub fn lenient_int_list<'de, D>(deserializer: D) -> Result<Option<Vec<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_int_list(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// `deserialize_with` helper: optional id list given as strings, `{id}` objects,
/// or a JSON-encoded string.
pub fn lenient_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_string_list(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Parses an optional query-string integer, recording an issue when it is malformed.
pub fn query_int(
    issues: &mut Issues,
    path: &str,
    raw: Option<&str>,
    range: std::ops::RangeInclusive<i64>,
) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<i64>() {
        Ok(value) => issues.int_in(path, value, range),
        Err(_) => {
            issues.push(path, "整数で指定してください");
            None
        }
    }
}
