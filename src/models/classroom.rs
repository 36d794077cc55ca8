use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation::{Issues, ORDER_RANGE, lenient_int};

pub const CAPACITY_RANGE: std::ops::RangeInclusive<i64> = 1..=100;
pub const COUNT_RANGE: std::ops::RangeInclusive<i64> = 1..=50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassroomType {
    #[serde(rename = "普通教室")]
    General,
    #[serde(rename = "特別教室")]
    Special,
    #[serde(rename = "理科室")]
    Science,
    #[serde(rename = "音楽室")]
    Music,
    #[serde(rename = "美術室")]
    Art,
    #[serde(rename = "技術室")]
    Technology,
    #[serde(rename = "家庭科室")]
    HomeEconomics,
    #[serde(rename = "体育館")]
    Gymnasium,
    #[serde(rename = "図書室")]
    Library,
    #[serde(rename = "コンピュータ室")]
    Computer,
    #[serde(rename = "多目的室")]
    MultiPurpose,
}

impl ClassroomType {
    pub const ALL: [ClassroomType; 11] = [
        ClassroomType::General,
        ClassroomType::Special,
        ClassroomType::Science,
        ClassroomType::Music,
        ClassroomType::Art,
        ClassroomType::Technology,
        ClassroomType::HomeEconomics,
        ClassroomType::Gymnasium,
        ClassroomType::Library,
        ClassroomType::Computer,
        ClassroomType::MultiPurpose,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ClassroomType::General => "普通教室",
            ClassroomType::Special => "特別教室",
            ClassroomType::Science => "理科室",
            ClassroomType::Music => "音楽室",
            ClassroomType::Art => "美術室",
            ClassroomType::Technology => "技術室",
            ClassroomType::HomeEconomics => "家庭科室",
            ClassroomType::Gymnasium => "体育館",
            ClassroomType::Library => "図書室",
            ClassroomType::Computer => "コンピュータ室",
            ClassroomType::MultiPurpose => "多目的室",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|t| t.label() == raw)
    }

    fn allowed_message() -> String {
        let labels: Vec<_> = Self::ALL.iter().map(|t| t.label()).collect();
        format!("次のいずれかを指定してください: {}", labels.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub classroom_type: ClassroomType,
    pub capacity: Option<i64>,
    /// Number of identical rooms of this type.
    pub count: i64,
    pub order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClassroom {
    pub name: String,
    pub classroom_type: ClassroomType,
    pub capacity: Option<i64>,
    pub count: i64,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassroomPatch {
    pub name: Option<String>,
    pub classroom_type: Option<ClassroomType>,
    pub capacity: Option<i64>,
    pub count: Option<i64>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        rename = "type",
        alias = "classroomType",
        alias = "classroom_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub classroom_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

pub type CreateClassroomRequest = ClassroomRequest;
pub type UpdateClassroomRequest = ClassroomRequest;

impl ClassroomRequest {
    pub fn validate_create(&self) -> Result<NewClassroom, AppError> {
        let mut issues = Issues::new();
        let name = issues.required_name("name", self.name.as_deref());
        let classroom_type = match self.classroom_type.as_deref() {
            Some(raw) => self.classroom_type(&mut issues, raw),
            None => {
                issues.push("type", "必須項目です");
                None
            }
        };
        let patch = self.numbers(&mut issues);

        issues.finish(())?;
        match classroom_type {
            Some(classroom_type) => Ok(NewClassroom {
                name: name.unwrap_or_default(),
                classroom_type,
                capacity: patch.capacity,
                count: patch.count.unwrap_or(1),
                order: patch.order,
            }),
            None => Err(AppError::validation("type", "必須項目です")),
        }
    }

    pub fn validate_update(&self) -> Result<ClassroomPatch, AppError> {
        let mut issues = Issues::new();
        let name = self.name.as_deref().and_then(|n| issues.name("name", n));
        let classroom_type = self
            .classroom_type
            .as_deref()
            .and_then(|raw| self.classroom_type(&mut issues, raw));
        let patch = self.numbers(&mut issues);
        issues.finish(ClassroomPatch {
            name,
            classroom_type,
            ..patch
        })
    }

    fn classroom_type(&self, issues: &mut Issues, raw: &str) -> Option<ClassroomType> {
        let parsed = ClassroomType::parse(raw);
        if parsed.is_none() {
            issues.push("type", ClassroomType::allowed_message());
        }
        parsed
    }

    fn numbers(&self, issues: &mut Issues) -> ClassroomPatch {
        ClassroomPatch {
            capacity: self.capacity.and_then(|c| issues.int_in("capacity", c, CAPACITY_RANGE)),
            count: self.count.and_then(|c| issues.int_in("count", c, COUNT_RANGE)),
            order: self.order.and_then(|o| issues.int_in("order", o, ORDER_RANGE)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> ClassroomRequest {
        serde_json::from_value(body).expect("request should deserialize")
    }

    #[test]
    fn test_create_defaults_count_to_one() {
        let new = request(json!({"name": "第1理科室", "type": "理科室", "capacity": "40"}))
            .validate_create()
            .unwrap();
        assert_eq!(new.classroom_type, ClassroomType::Science);
        assert_eq!(new.capacity, Some(40));
        assert_eq!(new.count, 1);
    }

    #[test]
    fn test_type_alias_and_closed_set() {
        let new = request(json!({"name": "音楽室A", "classroomType": "音楽室", "count": 2}))
            .validate_create()
            .unwrap();
        assert_eq!(new.classroom_type, ClassroomType::Music);
        assert_eq!(new.count, 2);

        assert!(request(json!({"name": "屋上", "type": "屋上"})).validate_create().is_err());
        assert!(request(json!({"name": "屋上"})).validate_create().is_err());
    }

    #[test]
    fn test_numeric_limits() {
        let err = request(json!({"name": "体育館", "type": "体育館", "capacity": 101, "count": 51}))
            .validate_create()
            .unwrap_err();
        let AppError::Validation(issues) = err else {
            panic!("expected validation error");
        };
        let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["capacity", "count"]);
    }

    #[test]
    fn test_serializes_type_as_label() {
        let value = serde_json::to_value(ClassroomType::ALL).unwrap();
        assert_eq!(value[0], "普通教室");
        assert_eq!(value[9], "コンピュータ室");
        for t in ClassroomType::ALL {
            assert_eq!(ClassroomType::parse(t.label()), Some(t));
        }
    }
}
