use serde::Deserialize;

use super::ClassroomType;
use super::classroom::CAPACITY_RANGE;
use super::listing::{ListParams, ListQuery, SortField};
use crate::error::AppError;
use crate::validation::{GRADE_RANGE, Issues, query_int, validate_id};

macro_rules! sort_field {
    ($name:ident { $($variant:ident => ($key:literal, $column:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl SortField for $name {
            fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($key => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn column(&self) -> &'static str {
                match self {
                    $($name::$variant => $column),+
                }
            }

            fn allowed() -> &'static [&'static str] {
                &[$($key),+]
            }
        }
    };
}

sort_field!(SubjectSort {
    Order => ("order", "sort_order"),
    Name => ("name", "name"),
    WeeklyHours => ("weeklyHours", "weekly_hours"),
    CreatedAt => ("createdAt", "created_at"),
    UpdatedAt => ("updatedAt", "updated_at"),
});

sort_field!(TeacherSort {
    Order => ("order", "sort_order"),
    Name => ("name", "name"),
    CreatedAt => ("createdAt", "created_at"),
    UpdatedAt => ("updatedAt", "updated_at"),
});

sort_field!(ClassroomSort {
    Order => ("order", "sort_order"),
    Name => ("name", "name"),
    Type => ("type", "type"),
    Capacity => ("capacity", "capacity"),
    Count => ("count", "count"),
    CreatedAt => ("createdAt", "created_at"),
    UpdatedAt => ("updatedAt", "updated_at"),
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectFilter {
    pub grade: Option<u8>,
    pub classroom_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherFilter {
    pub grade: Option<u8>,
    pub subject_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassroomFilter {
    pub classroom_type: Option<ClassroomType>,
    pub capacity_min: Option<i64>,
    pub capacity_max: Option<i64>,
}

pub type SubjectQuery = ListQuery<SubjectSort, SubjectFilter>;
pub type TeacherQuery = ListQuery<TeacherSort, TeacherFilter>;
pub type ClassroomQuery = ListQuery<ClassroomSort, ClassroomFilter>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectListParams {
    #[serde(flatten)]
    pub common: ListParams,
    pub grade: Option<String>,
    #[serde(alias = "classroom_type")]
    pub classroom_type: Option<String>,
}

impl SubjectListParams {
    pub fn validate(&self) -> Result<SubjectQuery, AppError> {
        let mut issues = Issues::new();
        let filter = SubjectFilter {
            grade: query_int(&mut issues, "grade", self.grade.as_deref(), GRADE_RANGE).map(|g| g as u8),
            classroom_type: non_empty(self.classroom_type.as_deref()),
        };
        let query = self.common.parse(&mut issues, filter);
        issues.finish(query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherListParams {
    #[serde(flatten)]
    pub common: ListParams,
    pub grade: Option<String>,
    #[serde(alias = "subject_id", alias = "subject")]
    pub subject_id: Option<String>,
}

impl TeacherListParams {
    pub fn validate(&self) -> Result<TeacherQuery, AppError> {
        let mut issues = Issues::new();
        let subject_id = non_empty(self.subject_id.as_deref());
        if let Some(id) = &subject_id {
            if validate_id(id).is_err() {
                issues.push("subjectId", "IDの形式が不正です");
            }
        }
        let filter = TeacherFilter {
            grade: query_int(&mut issues, "grade", self.grade.as_deref(), GRADE_RANGE).map(|g| g as u8),
            subject_id,
        };
        let query = self.common.parse(&mut issues, filter);
        issues.finish(query)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomListParams {
    #[serde(flatten)]
    pub common: ListParams,
    #[serde(rename = "type", alias = "classroomType")]
    pub classroom_type: Option<String>,
    #[serde(alias = "capacity_min")]
    pub capacity_min: Option<String>,
    #[serde(alias = "capacity_max")]
    pub capacity_max: Option<String>,
}

impl ClassroomListParams {
    pub fn validate(&self) -> Result<ClassroomQuery, AppError> {
        let mut issues = Issues::new();
        let classroom_type = non_empty(self.classroom_type.as_deref()).and_then(|raw| {
            let parsed = ClassroomType::parse(&raw);
            if parsed.is_none() {
                issues.push("type", "教室タイプが不正です");
            }
            parsed
        });
        let capacity_min = query_int(&mut issues, "capacityMin", self.capacity_min.as_deref(), CAPACITY_RANGE);
        let capacity_max = query_int(&mut issues, "capacityMax", self.capacity_max.as_deref(), CAPACITY_RANGE);
        if let (Some(min), Some(max)) = (capacity_min, capacity_max) {
            if min > max {
                issues.push("capacityMin", "capacityMax 以下で指定してください");
            }
        }
        let filter = ClassroomFilter {
            classroom_type,
            capacity_min,
            capacity_max,
        };
        let query = self.common.parse(&mut issues, filter);
        issues.finish(query)
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortOrder;

    #[test]
    fn test_subject_params() {
        let params = SubjectListParams {
            common: ListParams {
                sort: Some("weeklyHours".into()),
                order: Some("DESC".into()),
                ..Default::default()
            },
            grade: Some("2".into()),
            classroom_type: Some(" 理科室 ".into()),
        };
        let q = params.validate().unwrap();
        assert_eq!(q.sort, SubjectSort::WeeklyHours);
        assert_eq!(q.sort.column(), "weekly_hours");
        assert_eq!(q.order, SortOrder::Desc);
        assert_eq!(q.filter.grade, Some(2));
        assert_eq!(q.filter.classroom_type.as_deref(), Some("理科室"));
    }

    #[test]
    fn test_grade_filter_out_of_range() {
        let params = TeacherListParams {
            grade: Some("7".into()),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_capacity_range_must_be_ordered() {
        let params = ClassroomListParams {
            capacity_min: Some("40".into()),
            capacity_max: Some("20".into()),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = ClassroomListParams {
            classroom_type: Some("体育館".into()),
            capacity_min: Some("20".into()),
            ..Default::default()
        };
        let q = params.validate().unwrap();
        assert_eq!(q.filter.classroom_type, Some(ClassroomType::Gymnasium));
        assert_eq!(q.sort, ClassroomSort::Order);
    }

    #[test]
    fn test_query_string_deserialization() {
        let params: ClassroomListParams =
            serde_urlencoded_like("page=2&limit=10&type=%E7%90%86%E7%A7%91%E5%AE%A4&capacityMax=30");
        let q = params.validate().unwrap();
        assert_eq!(q.page.page, 2);
        assert_eq!(q.page.limit, 10);
        assert_eq!(q.filter.classroom_type, Some(ClassroomType::Science));
        assert_eq!(q.filter.capacity_max, Some(30));
    }

    /// Decodes the way axum's `Query` extractor does.
    fn serde_urlencoded_like<T: serde::de::DeserializeOwned>(qs: &str) -> T {
        let uri: axum::http::Uri = format!("http://localhost/classrooms?{}", qs).parse().unwrap();
        axum::extract::Query::<T>::try_from_uri(&uri).unwrap().0
    }
}
