//! Typed HTTP client for the admin API, as used by the data-management screens.
//!
//! Requests always ask for the canonical (`X-API-Version: 2`) payload shape.

mod error;

pub use error::ClientError;

use std::time::Duration;

use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::response::{ApiResponse, Deleted};
use crate::error::ErrorResponse;
use crate::models::listing::MAX_LIMIT;
use crate::models::{
    Classroom, ClassroomRequest, Paged, Pagination, SchoolSettingsView, SettingsValues, SortOrder,
    Subject, SubjectRequest, Teacher, TeacherRequest,
};
use crate::views::{API_VERSION_HEADER, ApiVersion};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after a connection failure.
    pub retries: u32,
    pub retry_delay: Duration,
    pub bearer_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout: Duration::from_secs(10),
            retries: 2,
            retry_delay: Duration::from_millis(500),
            bearer_token: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    /// Entity-specific filters such as `grade` or `capacityMin`.
    pub filters: Vec<(String, String)>,
}

impl ListOptions {
    pub fn page(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order".to_string(), order.sql().to_lowercase()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

/// List payload; the item key depends on the entity.
#[derive(Deserialize)]
struct PageBody<T> {
    #[serde(alias = "subjects", alias = "teachers", alias = "classrooms")]
    items: Vec<T>,
    pagination: Pagination,
}

/// Everything the data-management page loads on mount.
#[derive(Debug, Clone)]
pub struct DataSnapshot {
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub classrooms: Vec<Classroom>,
    pub settings: SchoolSettingsView,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base = Url::parse(&base).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let http = Client::builder()
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build http client: {}", e)))?;
        Ok(Self { http, base, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let url = self.url("health", &[])?;
        let response = self.execute::<()>(Method::GET, url, None).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    pub async fn list_subjects(&self, options: &ListOptions) -> Result<Paged<Subject>, ClientError> {
        self.list("subjects", options).await
    }

    pub async fn list_all_subjects(&self) -> Result<Vec<Subject>, ClientError> {
        self.list_all("subjects").await
    }

    pub async fn get_subject(&self, id: &str) -> Result<Subject, ClientError> {
        self.call::<(), _>(Method::GET, &format!("subjects/{}", id), None).await
    }

    pub async fn create_subject(&self, req: &SubjectRequest) -> Result<Subject, ClientError> {
        self.call(Method::POST, "subjects", Some(req)).await
    }

    pub async fn update_subject(&self, id: &str, req: &SubjectRequest) -> Result<Subject, ClientError> {
        self.call(Method::PUT, &format!("subjects/{}", id), Some(req)).await
    }

    pub async fn delete_subject(&self, id: &str) -> Result<Deleted, ClientError> {
        self.call::<(), _>(Method::DELETE, &format!("subjects/{}", id), None).await
    }

    pub async fn list_teachers(&self, options: &ListOptions) -> Result<Paged<Teacher>, ClientError> {
        self.list("teachers", options).await
    }

    pub async fn list_all_teachers(&self) -> Result<Vec<Teacher>, ClientError> {
        self.list_all("teachers").await
    }

    pub async fn get_teacher(&self, id: &str) -> Result<Teacher, ClientError> {
        self.call::<(), _>(Method::GET, &format!("teachers/{}", id), None).await
    }

    pub async fn create_teacher(&self, req: &TeacherRequest) -> Result<Teacher, ClientError> {
        self.call(Method::POST, "teachers", Some(req)).await
    }

    pub async fn update_teacher(&self, id: &str, req: &TeacherRequest) -> Result<Teacher, ClientError> {
        self.call(Method::PUT, &format!("teachers/{}", id), Some(req)).await
    }

    pub async fn delete_teacher(&self, id: &str) -> Result<Deleted, ClientError> {
        self.call::<(), _>(Method::DELETE, &format!("teachers/{}", id), None).await
    }

    pub async fn list_classrooms(&self, options: &ListOptions) -> Result<Paged<Classroom>, ClientError> {
        self.list("classrooms", options).await
    }

    pub async fn list_all_classrooms(&self) -> Result<Vec<Classroom>, ClientError> {
        self.list_all("classrooms").await
    }

    pub async fn get_classroom(&self, id: &str) -> Result<Classroom, ClientError> {
        self.call::<(), _>(Method::GET, &format!("classrooms/{}", id), None).await
    }

    pub async fn create_classroom(&self, req: &ClassroomRequest) -> Result<Classroom, ClientError> {
        self.call(Method::POST, "classrooms", Some(req)).await
    }

    pub async fn update_classroom(&self, id: &str, req: &ClassroomRequest) -> Result<Classroom, ClientError> {
        self.call(Method::PUT, &format!("classrooms/{}", id), Some(req)).await
    }

    pub async fn delete_classroom(&self, id: &str) -> Result<Deleted, ClientError> {
        self.call::<(), _>(Method::DELETE, &format!("classrooms/{}", id), None).await
    }

    pub async fn get_school_settings(&self) -> Result<SchoolSettingsView, ClientError> {
        self.call::<(), _>(Method::GET, "school-settings", None).await
    }

    pub async fn update_school_settings(&self, values: &SettingsValues) -> Result<SchoolSettingsView, ClientError> {
        self.call(Method::PUT, "school-settings", Some(values)).await
    }

    pub async fn load_snapshot(&self) -> Result<DataSnapshot, ClientError> {
        let (subjects, teachers, classrooms, settings) = tokio::try_join!(
            self.list_all_subjects(),
            self.list_all_teachers(),
            self.list_all_classrooms(),
            self.get_school_settings(),
        )?;
        debug!(
            "loaded snapshot: {} subjects, {} teachers, {} classrooms",
            subjects.len(),
            teachers.len(),
            classrooms.len()
        );
        Ok(DataSnapshot {
            subjects,
            teachers,
            classrooms,
            settings,
        })
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, options: &ListOptions) -> Result<Paged<T>, ClientError> {
        let url = self.url(path, &options.pairs())?;
        let body: PageBody<T> = self.fetch::<(), _>(Method::GET, url, None).await?;
        Ok(Paged {
            items: body.items,
            pagination: body.pagination,
        })
    }

    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let batch: Paged<T> = self.list(path, &ListOptions::page(page, MAX_LIMIT)).await?;
            let done = batch.items.is_empty() || page >= batch.pagination.total_pages;
            items.extend(batch.items);
            if done {
                return Ok(items);
            }
            page += 1;
        }
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, &[])?;
        self.fetch(method, url, body).await
    }

    async fn fetch<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(method, url, body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(response).await);
        }

        let bytes = response.bytes().await.map_err(ClientError::transport)?;
        let envelope: ApiResponse<T> =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        if !envelope.success {
            return Err(ClientError::InvalidResponse("success flag was false on a 2xx response".to_string()));
        }
        Ok(envelope.data)
    }

    /// Sends once, then retries connection failures up to `retries` times.
    async fn execute<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header(API_VERSION_HEADER, ApiVersion::V2.as_str())
                .timeout(self.config.timeout);
            if let Some(token) = &self.config.bearer_token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!("{} {} failed to connect (attempt {}): {}", method, url, attempt, e);
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err(ClientError::transport(e)),
            }
        }
    }

    async fn api_error(response: Response) -> ClientError {
        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return ClientError::transport(e),
        };
        match serde_json::from_slice::<ErrorResponse>(&bytes) {
            Ok(body) => ClientError::Api {
                status: status.as_u16(),
                code: body.error,
                message: body.message,
                details: body.details,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: format!("HTTP_{}", status.as_u16()),
                message: String::from_utf8_lossy(&bytes).into_owned(),
                details: None,
            },
        }
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:3000/api")).unwrap();
        let url = client.url("subjects/math", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/subjects/math");
    }

    #[test]
    fn test_list_options_become_query_pairs() {
        let options = ListOptions {
            search: Some("数 学".into()),
            order: Some(SortOrder::Desc),
            ..ListOptions::page(2, 10)
        }
        .filter("grade", 3);

        let client = ApiClient::new(ClientConfig::default()).unwrap();
        let url = client.url("subjects", &options.pairs()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("search".to_string(), "数 学".to_string()),
                ("order".to_string(), "desc".to_string()),
                ("grade".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::new(ClientConfig::new("not a url")).err().unwrap();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_page_body_accepts_any_entity_key() {
        let body: PageBody<serde_json::Value> = serde_json::from_str(
            r#"{"teachers":[{"id":"t1"}],"pagination":{"page":1,"limit":20,"total":1,"totalPages":1}}"#,
        )
        .unwrap();
        assert_eq!(body.items.len(), 1);
        assert_eq!(body.pagination.total_pages, 1);
    }
}
