use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::codec::encode_list;
use super::repository::Repository;
use super::rows::{ClassroomRow, SubjectRow, TeacherRow};
use crate::models::listing::SortField;
use crate::models::school_settings::SETTINGS_ID;
use crate::models::{
    Classroom, ClassroomPatch, ClassroomQuery, EntityCounts, NewClassroom, NewSubject, NewTeacher,
    PageRequest, Paged, Pagination, SchoolSettings, SettingsValues, SortOrder, Subject,
    SubjectPatch, SubjectQuery, Teacher, TeacherPatch, TeacherQuery, timestamp_now,
};

#[derive(Clone)]
pub struct SqliteRepository {
    db: SqlitePool,
}

impl SqliteRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Runs a COUNT and a LIMIT/OFFSET page over `table` with the same WHERE clause.
    async fn paginate<R, T, F>(
        &self,
        table: &'static str,
        page: PageRequest,
        order_by: String,
        push_filters: F,
    ) -> Result<Paged<T>, sqlx::Error>
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        T: From<R>,
        F: for<'a> Fn(&mut QueryBuilder<'a, Sqlite>) + Send + Sync,
    {
        let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {} WHERE 1 = 1", table));
        push_filters(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {} WHERE 1 = 1", table));
        push_filters(&mut select);
        select.push(format!(" ORDER BY {}", order_by));
        select.push(" LIMIT ").push_bind(page.limit);
        select.push(" OFFSET ").push_bind(page.offset());
        let rows: Vec<R> = select.build_query_as().fetch_all(&self.db).await?;

        Ok(Paged {
            items: rows.into_iter().map(T::from).collect(),
            pagination: Pagination::new(page, total),
        })
    }

    async fn count(&self, table: &'static str) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        sqlx::query_scalar(&sql).fetch_one(&self.db).await
    }

    async fn delete(&self, table: &'static str, id: &str) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table);
        let affected = sqlx::query(&sql)
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn order_clause<S: SortField>(sort: S, order: SortOrder) -> String {
    format!("{} {}, id ASC", sort.column(), order.sql())
}

fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_name_search(qb: &mut QueryBuilder<'_, Sqlite>, search: Option<&str>) {
    if let Some(search) = search {
        qb.push(" AND name LIKE ")
            .push_bind(like_pattern(search))
            .push(" ESCAPE '\\'");
    }
}

/// Matches rows whose JSON array column contains `value`; malformed JSON never matches.
fn push_json_contains<T>(qb: &mut QueryBuilder<'_, Sqlite>, column: &'static str, value: T)
where
    T: for<'q> sqlx::Encode<'q, Sqlite> + sqlx::Type<Sqlite> + Send + 'static,
{
    qb.push(format!(
        " CASE WHEN json_valid({col}) THEN EXISTS (SELECT 1 FROM json_each({col}) WHERE json_each.value = ",
        col = column
    ))
    .push_bind(value)
    .push(") ELSE 0 END");
}

fn encode<T: serde::Serialize>(items: &[T]) -> Result<String, sqlx::Error> {
    encode_list(items).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("select 1").execute(&self.db).await?;
        Ok(())
    }

    async fn list_subjects(&self, query: &SubjectQuery) -> Result<Paged<Subject>, sqlx::Error> {
        let filter = &query.filter;
        let search = query.search.as_deref();
        self.paginate::<SubjectRow, Subject, _>(
            "subjects",
            query.page,
            order_clause(query.sort, query.order),
            |qb| {
                push_name_search(qb, search);
                if let Some(grade) = filter.grade {
                    qb.push(" AND (target_grades = '[]' OR");
                    push_json_contains(qb, "subjects.target_grades", i64::from(grade));
                    qb.push(")");
                }
                if let Some(classroom_type) = &filter.classroom_type {
                    qb.push(" AND special_classroom = ").push_bind(classroom_type.clone());
                }
            },
        )
        .await
    }

    async fn find_subject(&self, id: &str) -> Result<Option<Subject>, sqlx::Error> {
        let row = sqlx::query_as::<_, SubjectRow>("SELECT * FROM subjects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Subject::from))
    }

    async fn insert_subject(&self, new: NewSubject) -> Result<String, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();
        let grades = encode(&new.grades)?;

        sqlx::query(
            r#"
            INSERT INTO subjects
                (id, name, target_grades, weekly_hours, special_classroom, sort_order,
                created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5,
                COALESCE(?6, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM subjects)),
                ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&new.name)
        .bind(grades)
        .bind(new.weekly_hours)
        .bind(&new.special_classroom)
        .bind(new.order)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(id)
    }

    async fn update_subject(&self, id: &str, patch: SubjectPatch, updated_at: &str) -> Result<bool, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE subjects SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(grades) = patch.grades {
            set.push("target_grades = ").push_bind_unseparated(encode(&grades)?);
        }
        if let Some(hours) = patch.weekly_hours {
            set.push("weekly_hours = ").push_bind_unseparated(hours);
        }
        if let Some(special) = patch.special_classroom {
            set.push("special_classroom = ").push_bind_unseparated(special);
        }
        if let Some(order) = patch.order {
            set.push("sort_order = ").push_bind_unseparated(order);
        }
        set.push("updated_at = ").push_bind_unseparated(updated_at.to_string());
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let affected = qb.build().execute(&self.db).await?.rows_affected();
        Ok(affected > 0)
    }

    async fn delete_subject(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.delete("subjects", id).await
    }

    async fn list_teachers(&self, query: &TeacherQuery) -> Result<Paged<Teacher>, sqlx::Error> {
        let filter = &query.filter;
        let search = query.search.as_deref();
        self.paginate::<TeacherRow, Teacher, _>(
            "teachers",
            query.page,
            order_clause(query.sort, query.order),
            |qb| {
                push_name_search(qb, search);
                if let Some(grade) = filter.grade {
                    qb.push(" AND");
                    push_json_contains(qb, "teachers.grades", i64::from(grade));
                }
                if let Some(subject_id) = &filter.subject_id {
                    qb.push(" AND");
                    push_json_contains(qb, "teachers.subjects", subject_id.clone());
                }
            },
        )
        .await
    }

    async fn find_teacher(&self, id: &str) -> Result<Option<Teacher>, sqlx::Error> {
        let row = sqlx::query_as::<_, TeacherRow>("SELECT * FROM teachers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Teacher::from))
    }

    async fn insert_teacher(&self, new: NewTeacher) -> Result<String, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            r#"
            INSERT INTO teachers
                (id, name, subjects, grades, assignment_restrictions, sort_order,
                created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5,
                COALESCE(?6, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM teachers)),
                ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&new.name)
        .bind(encode(&new.subjects)?)
        .bind(encode(&new.grades)?)
        .bind(encode(&new.assignment_restrictions)?)
        .bind(new.order)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(id)
    }

    async fn update_teacher(&self, id: &str, patch: TeacherPatch, updated_at: &str) -> Result<bool, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE teachers SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(subjects) = patch.subjects {
            set.push("subjects = ").push_bind_unseparated(encode(&subjects)?);
        }
        if let Some(grades) = patch.grades {
            set.push("grades = ").push_bind_unseparated(encode(&grades)?);
        }
        if let Some(restrictions) = patch.assignment_restrictions {
            set.push("assignment_restrictions = ")
                .push_bind_unseparated(encode(&restrictions)?);
        }
        if let Some(order) = patch.order {
            set.push("sort_order = ").push_bind_unseparated(order);
        }
        set.push("updated_at = ").push_bind_unseparated(updated_at.to_string());
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let affected = qb.build().execute(&self.db).await?.rows_affected();
        Ok(affected > 0)
    }

    async fn delete_teacher(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.delete("teachers", id).await
    }

    async fn list_classrooms(&self, query: &ClassroomQuery) -> Result<Paged<Classroom>, sqlx::Error> {
        let filter = &query.filter;
        let search = query.search.as_deref();
        self.paginate::<ClassroomRow, Classroom, _>(
            "classrooms",
            query.page,
            order_clause(query.sort, query.order),
            |qb| {
                push_name_search(qb, search);
                if let Some(classroom_type) = filter.classroom_type {
                    qb.push(" AND type = ").push_bind(classroom_type.label());
                }
                if let Some(min) = filter.capacity_min {
                    qb.push(" AND capacity >= ").push_bind(min);
                }
                if let Some(max) = filter.capacity_max {
                    qb.push(" AND capacity <= ").push_bind(max);
                }
            },
        )
        .await
    }

    async fn find_classroom(&self, id: &str) -> Result<Option<Classroom>, sqlx::Error> {
        let row = sqlx::query_as::<_, ClassroomRow>("SELECT * FROM classrooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Classroom::from))
    }

    async fn insert_classroom(&self, new: NewClassroom) -> Result<String, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            r#"
            INSERT INTO classrooms
                (id, name, type, capacity, count, sort_order, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5,
                COALESCE(?6, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM classrooms)),
                ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&new.name)
        .bind(new.classroom_type.label())
        .bind(new.capacity)
        .bind(new.count)
        .bind(new.order)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(id)
    }

    async fn update_classroom(&self, id: &str, patch: ClassroomPatch, updated_at: &str) -> Result<bool, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE classrooms SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(classroom_type) = patch.classroom_type {
            set.push("type = ").push_bind_unseparated(classroom_type.label());
        }
        if let Some(capacity) = patch.capacity {
            set.push("capacity = ").push_bind_unseparated(capacity);
        }
        if let Some(count) = patch.count {
            set.push("count = ").push_bind_unseparated(count);
        }
        if let Some(order) = patch.order {
            set.push("sort_order = ").push_bind_unseparated(order);
        }
        set.push("updated_at = ").push_bind_unseparated(updated_at.to_string());
        qb.push(" WHERE id = ").push_bind(id.to_string());

        let affected = qb.build().execute(&self.db).await?.rows_affected();
        Ok(affected > 0)
    }

    async fn delete_classroom(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.delete("classrooms", id).await
    }

    async fn fetch_settings(&self) -> Result<Option<SchoolSettings>, sqlx::Error> {
        sqlx::query_as::<_, SchoolSettings>("SELECT * FROM school_settings WHERE id = ?")
            .bind(SETTINGS_ID)
            .fetch_optional(&self.db)
            .await
    }

    async fn ensure_settings(&self) -> Result<SchoolSettings, sqlx::Error> {
        let defaults = SettingsValues::default();
        let now = timestamp_now();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO school_settings
                (id, grade1_classes, grade2_classes, grade3_classes, daily_periods,
                saturday_periods, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(SETTINGS_ID)
        .bind(defaults.grade1_classes)
        .bind(defaults.grade2_classes)
        .bind(defaults.grade3_classes)
        .bind(defaults.daily_periods)
        .bind(defaults.saturday_periods)
        .bind(&now)
        .execute(&self.db)
        .await?;

        self.fetch_settings().await?.ok_or(sqlx::Error::RowNotFound)
    }

    async fn update_settings(&self, values: SettingsValues, updated_at: &str) -> Result<bool, sqlx::Error> {
        let affected = sqlx::query(
            r#"
            UPDATE school_settings
            SET grade1_classes = ?1,
                grade2_classes = ?2,
                grade3_classes = ?3,
                daily_periods = ?4,
                saturday_periods = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(values.grade1_classes)
        .bind(values.grade2_classes)
        .bind(values.grade3_classes)
        .bind(values.daily_periods)
        .bind(values.saturday_periods)
        .bind(updated_at)
        .bind(SETTINGS_ID)
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn entity_counts(&self) -> Result<EntityCounts, sqlx::Error> {
        let (teachers, subjects, classrooms) = tokio::try_join!(
            self.count("teachers"),
            self.count("subjects"),
            self.count("classrooms"),
        )?;
        Ok(EntityCounts {
            teachers,
            subjects,
            classrooms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory_pool;
    use crate::models::{
        ClassroomFilter, ClassroomSort, ClassroomType, ListQuery, SubjectFilter, SubjectSort,
        TeacherFilter, TeacherSort,
    };

    async fn setup_test_repo() -> SqliteRepository {
        let pool = in_memory_pool().await.expect("Failed to create test db");
        SqliteRepository::new(pool)
    }

    fn new_subject(name: &str, grades: Vec<u8>) -> NewSubject {
        NewSubject {
            name: name.to_string(),
            grades,
            weekly_hours: 3,
            special_classroom: String::new(),
            order: None,
        }
    }

    fn subject_query(search: Option<&str>, filter: SubjectFilter) -> SubjectQuery {
        ListQuery {
            page: PageRequest { page: 1, limit: 100 },
            search: search.map(str::to_string),
            sort: SubjectSort::Order,
            order: SortOrder::Asc,
            filter,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_subject() {
        let repo = setup_test_repo().await;

        let id = repo
            .insert_subject(new_subject("数学", vec![1, 2]))
            .await
            .expect("Failed to insert subject");
        let subject = repo
            .find_subject(&id)
            .await
            .expect("Failed to fetch subject")
            .expect("Subject not found");

        assert_eq!(subject.name, "数学");
        assert_eq!(subject.grades, vec![1, 2]);
        assert_eq!(subject.weekly_hours, 3);
        assert_eq!(subject.order, 1);
        assert_eq!(subject.created_at, subject.updated_at);
        assert!(!subject.requires_special_classroom());
    }

    #[tokio::test]
    async fn test_sort_order_appends_when_omitted() {
        let repo = setup_test_repo().await;
        let mut explicit = new_subject("国語", vec![]);
        explicit.order = Some(10);
        repo.insert_subject(explicit).await.unwrap();
        let id = repo.insert_subject(new_subject("英語", vec![])).await.unwrap();

        let subject = repo.find_subject(&id).await.unwrap().unwrap();
        assert_eq!(subject.order, 11);
    }

    #[tokio::test]
    async fn test_subject_search_and_grade_filter() {
        let repo = setup_test_repo().await;
        repo.insert_subject(new_subject("数学", vec![1])).await.unwrap();
        repo.insert_subject(new_subject("数学演習", vec![3])).await.unwrap();
        repo.insert_subject(new_subject("道徳", vec![])).await.unwrap();
        repo.insert_subject(new_subject("100%_理科", vec![2])).await.unwrap();

        let page = repo
            .list_subjects(&subject_query(Some("数学"), SubjectFilter::default()))
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);

        let page = repo
            .list_subjects(&subject_query(Some("%_"), SubjectFilter::default()))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "100%_理科");

        let grade3 = SubjectFilter {
            grade: Some(3),
            ..Default::default()
        };
        let names: Vec<_> = repo
            .list_subjects(&subject_query(None, grade3))
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["数学演習", "道徳"]);
    }

    #[tokio::test]
    async fn test_pagination_partitions_rows() {
        let repo = setup_test_repo().await;
        for i in 0..25 {
            let mut subject = new_subject(&format!("教科{:02}", i), vec![]);
            subject.order = Some(i % 3);
            repo.insert_subject(subject).await.unwrap();
        }

        let mut seen = std::collections::HashSet::new();
        for page_no in 1..=3 {
            let mut query = subject_query(None, SubjectFilter::default());
            query.page = PageRequest { page: page_no, limit: 10 };
            let page = repo.list_subjects(&query).await.unwrap();
            assert_eq!(page.pagination.total, 25);
            assert_eq!(page.pagination.total_pages, 3);
            for s in page.items {
                assert!(seen.insert(s.id));
            }
        }
        assert_eq!(seen.len(), 25);
    }

    #[tokio::test]
    async fn test_update_subject_partial() {
        let repo = setup_test_repo().await;
        let id = repo.insert_subject(new_subject("数学", vec![1])).await.unwrap();
        let before = repo.find_subject(&id).await.unwrap().unwrap();

        let patch = SubjectPatch {
            name: Some("応用数学".into()),
            ..Default::default()
        };
        let updated_at = crate::models::next_timestamp(&before.updated_at);
        assert!(repo.update_subject(&id, patch, &updated_at).await.unwrap());

        let after = repo.find_subject(&id).await.unwrap().unwrap();
        assert_eq!(after.name, "応用数学");
        assert_eq!(after.grades, before.grades);
        assert_eq!(after.weekly_hours, before.weekly_hours);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);

        let missing = repo
            .update_subject("missing", SubjectPatch::default(), &updated_at)
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_delete_subject() {
        let repo = setup_test_repo().await;
        let id = repo.insert_subject(new_subject("技術", vec![])).await.unwrap();

        assert!(repo.delete_subject(&id).await.unwrap());
        assert!(repo.find_subject(&id).await.unwrap().is_none());
        assert!(!repo.delete_subject(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_teacher_filters() {
        let repo = setup_test_repo().await;
        repo.insert_teacher(NewTeacher {
            name: "田中".into(),
            subjects: vec!["math".into()],
            grades: vec![1, 2],
            assignment_restrictions: vec![],
            order: None,
        })
        .await
        .unwrap();
        repo.insert_teacher(NewTeacher {
            name: "佐藤".into(),
            subjects: vec!["science".into(), "math".into()],
            grades: vec![3],
            assignment_restrictions: vec![],
            order: None,
        })
        .await
        .unwrap();

        let query = |filter: TeacherFilter| ListQuery {
            page: PageRequest::default(),
            search: None,
            sort: TeacherSort::Name,
            order: SortOrder::Desc,
            filter,
        };

        let by_subject = repo
            .list_teachers(&query(TeacherFilter {
                subject_id: Some("math".into()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(by_subject.pagination.total, 2);

        let by_grade = repo
            .list_teachers(&query(TeacherFilter {
                grade: Some(3),
                subject_id: Some("science".into()),
            }))
            .await
            .unwrap();
        assert_eq!(by_grade.items.len(), 1);
        assert_eq!(by_grade.items[0].name, "佐藤");
    }

    #[tokio::test]
    async fn test_classroom_filters_and_update() {
        let repo = setup_test_repo().await;
        for (name, ty, cap) in [
            ("1年1組", ClassroomType::General, Some(35)),
            ("第1理科室", ClassroomType::Science, Some(40)),
            ("第2理科室", ClassroomType::Science, Some(20)),
            ("体育館", ClassroomType::Gymnasium, None),
        ] {
            repo.insert_classroom(NewClassroom {
                name: name.into(),
                classroom_type: ty,
                capacity: cap,
                count: 1,
                order: None,
            })
            .await
            .unwrap();
        }

        let query = ListQuery {
            page: PageRequest::default(),
            search: None,
            sort: ClassroomSort::Capacity,
            order: SortOrder::Asc,
            filter: ClassroomFilter {
                classroom_type: Some(ClassroomType::Science),
                capacity_min: Some(30),
                capacity_max: None,
            },
        };
        let page = repo.list_classrooms(&query).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "第1理科室");

        let id = page.items[0].id.clone();
        let patch = ClassroomPatch {
            count: Some(2),
            ..Default::default()
        };
        assert!(repo.update_classroom(&id, patch, &timestamp_now()).await.unwrap());
        let updated = repo.find_classroom(&id).await.unwrap().unwrap();
        assert_eq!(updated.count, 2);
        assert_eq!(updated.capacity, Some(40));
        assert_eq!(updated.classroom_type, ClassroomType::Science);
    }

    #[tokio::test]
    async fn test_settings_singleton_and_counts() {
        let repo = setup_test_repo().await;
        let seeded = repo.fetch_settings().await.unwrap().expect("seeded settings row");
        assert_eq!(seeded.id, SETTINGS_ID);
        assert_eq!(seeded.daily_periods, 6);

        let values = SettingsValues {
            grade1_classes: 5,
            ..SettingsValues::default()
        };
        assert!(repo.update_settings(values, &timestamp_now()).await.unwrap());
        assert_eq!(repo.ensure_settings().await.unwrap().grade1_classes, 5);

        sqlx::query("DELETE FROM school_settings").execute(repo.pool()).await.unwrap();
        assert!(repo.fetch_settings().await.unwrap().is_none());
        assert_eq!(repo.ensure_settings().await.unwrap().grade1_classes, 4);

        repo.insert_subject(new_subject("数学", vec![])).await.unwrap();
        let counts = repo.entity_counts().await.unwrap();
        assert_eq!(counts, EntityCounts { teachers: 0, subjects: 1, classrooms: 0 });
    }
}
