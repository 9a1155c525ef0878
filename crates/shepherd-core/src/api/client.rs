//! API client for the church-management REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against groups, role strategies, attendance, people, churches,
//! worships and events.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::attendance::AttendanceQuery;
use crate::auth::SessionData;
use crate::groups::GeoBounds;
use crate::models::attendance::AttendanceUpdate;
use crate::models::{
    AttendanceStatus, AttendanceSummary, Church, ChurchEvent, HomeGroup, Meeting,
    MeetingAttendance, Page, Person, RoleStrategyNode, Worship,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Page size for a map viewport query; a viewport shows every group in it.
const MAP_PAGE_SIZE: u32 = 500;

/// Newest meetings first.
const MEETINGS_SORT: &str = "date,desc";

const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    access_token: String,
    user: SignInUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInUser {
    id: i64,
    #[serde(default)]
    church_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_role_id: Option<i64>,
}

/// API client for the church-management backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sign in and return session data
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<SessionData> {
        let url = self.url("/auth/sign-in");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&SignInRequest {
                email: username,
                password,
            })
            .send()
            .await
            .context("Failed to send sign-in request")?;

        let response = Self::check_response(response).await?;

        let auth: SignInResponse = response
            .json()
            .await
            .context("Failed to parse sign-in response")?;

        Ok(SessionData {
            token: auth.access_token,
            user_id: auth.user.id,
            church_id: auth.user.church_id,
            username: username.to_string(),
            created_at: Utc::now(),
        })
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Send a JSON body and parse the JSON answer
    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Send a request whose answer body is ignored
    async fn send_no_content(&self, method: Method, path: &str, body: Option<&serde_json::Value>) -> Result<()> {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Home Groups =====

    pub async fn fetch_groups(&self, page: u32, size: u32) -> Result<Page<HomeGroup>> {
        self.get("/groups", &[("page", page), ("size", size)]).await
    }

    pub async fn fetch_group(&self, group_id: i64) -> Result<HomeGroup> {
        self.get(&format!("/groups/{}", group_id), NO_QUERY).await
    }

    /// Groups whose location falls inside the map viewport
    pub async fn fetch_groups_in_bounds(&self, bounds: &GeoBounds) -> Result<Vec<HomeGroup>> {
        let b = bounds.normalized();
        let page: Page<HomeGroup> = self
            .get(
                "/groups",
                &[
                    ("north", b.north.to_string()),
                    ("south", b.south.to_string()),
                    ("east", b.east.to_string()),
                    ("west", b.west.to_string()),
                    ("size", MAP_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        debug!(
            count = page.content.len(),
            total = page.total_elements,
            "Fetched groups in bounds"
        );
        // The server filters by bounds; drop anything without coordinates it let through
        Ok(b.filter(&page.content).into_iter().cloned().collect())
    }

    /// Meetings of a group, most recent first.
    pub async fn fetch_meetings(&self, group_id: i64, page: u32, size: u32) -> Result<Page<Meeting>> {
        self.get(
            &format!("/groups/{}/meetings", group_id),
            &[
                ("page", page.to_string()),
                ("size", size.to_string()),
                ("sort", MEETINGS_SORT.to_string()),
            ],
        )
        .await
    }

    // ===== Attendance =====

    pub async fn fetch_attendance(&self, query: &AttendanceQuery) -> Result<Page<MeetingAttendance>> {
        let path = format!(
            "/groups/{}/meetings/{}/attendance",
            query.meeting.group_id, query.meeting.meeting_id
        );
        let mut params = vec![
            ("page", query.page.to_string()),
            ("size", query.size.to_string()),
        ];
        if let Some(ref search) = query.search {
            params.push(("search", search.clone()));
        }
        self.get(&path, &params).await
    }

    pub async fn set_attendance(
        &self,
        group_id: i64,
        meeting_id: i64,
        person_id: i64,
        status: AttendanceStatus,
    ) -> Result<()> {
        let path = format!("/groups/{}/meetings/{}/attendance", group_id, meeting_id);
        let body = serde_json::to_value(AttendanceUpdate { person_id, status })?;
        self.send_no_content(Method::PUT, &path, Some(&body)).await
    }

    pub async fn fetch_attendance_summary(&self, group_id: i64, meeting_id: i64) -> Result<AttendanceSummary> {
        self.get(
            &format!("/groups/{}/meetings/{}/attendance/summary", group_id, meeting_id),
            NO_QUERY,
        )
        .await
    }

    // ===== Role Strategies =====

    /// Roles of a strategy, either nested or flat depending on the server
    pub async fn fetch_roles(&self, strategy_id: i64) -> Result<Vec<RoleStrategyNode>> {
        self.get(&format!("/groups/strategies/{}/roles", strategy_id), NO_QUERY)
            .await
    }

    pub async fn create_role(
        &self,
        strategy_id: i64,
        name: &str,
        parent_role_id: Option<i64>,
    ) -> Result<RoleStrategyNode> {
        self.send(
            Method::POST,
            &format!("/groups/strategies/{}/roles", strategy_id),
            &RoleRequest {
                name,
                parent_role_id,
            },
        )
        .await
    }

    pub async fn update_role(&self, strategy_id: i64, role_id: i64, name: &str) -> Result<RoleStrategyNode> {
        self.send(
            Method::PUT,
            &format!("/groups/strategies/{}/roles/{}", strategy_id, role_id),
            &RoleRequest {
                name,
                parent_role_id: None,
            },
        )
        .await
    }

    pub async fn delete_role(&self, strategy_id: i64, role_id: i64) -> Result<()> {
        self.send_no_content(
            Method::DELETE,
            &format!("/groups/strategies/{}/roles/{}", strategy_id, role_id),
            None,
        )
        .await
    }

    pub async fn assign_person(&self, strategy_id: i64, role_id: i64, person_id: i64) -> Result<()> {
        self.send_no_content(
            Method::POST,
            &format!("/groups/strategies/{}/roles/{}/people/{}", strategy_id, role_id, person_id),
            None,
        )
        .await
    }

    pub async fn remove_person(&self, strategy_id: i64, role_id: i64, person_id: i64) -> Result<()> {
        self.send_no_content(
            Method::DELETE,
            &format!("/groups/strategies/{}/roles/{}/people/{}", strategy_id, role_id, person_id),
            None,
        )
        .await
    }

    // ===== People =====

    pub async fn fetch_people(&self, page: u32, size: u32, search: Option<&str>) -> Result<Page<Person>> {
        let mut params = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(search) = search {
            params.push(("search", search.to_string()));
        }
        self.get("/people", &params).await
    }

    pub async fn fetch_person(&self, person_id: i64) -> Result<Person> {
        self.get(&format!("/people/{}", person_id), NO_QUERY).await
    }

    // ===== Churches, Worships, Events =====

    pub async fn fetch_churches(&self, page: u32, size: u32) -> Result<Page<Church>> {
        self.get("/churches", &[("page", page), ("size", size)]).await
    }

    pub async fn fetch_worships(&self, church_id: Option<i64>, page: u32, size: u32) -> Result<Page<Worship>> {
        let mut params = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(id) = church_id {
            params.push(("churchId", id.to_string()));
        }
        self.get("/worships", &params).await
    }

    pub async fn fetch_events(&self, page: u32, size: u32) -> Result<Page<ChurchEvent>> {
        self.get("/events", &[("page", page), ("size", size)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::TestServer;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("https://api.example.org/v1/").expect("client should build");
        assert_eq!(client.base_url(), "https://api.example.org/v1");
        assert_eq!(client.url("/groups/3"), "https://api.example.org/v1/groups/3");
    }

    #[test]
    fn test_with_token_sets_authorization_header() {
        let client = ApiClient::new("http://localhost:8080").expect("client should build");
        assert!(client.auth_headers().expect("headers").is_empty());

        let authed = client.with_token("abc123".to_string());
        let headers = authed.auth_headers().expect("headers");
        assert_eq!(
            headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Bearer abc123")
        );
        assert_eq!(authed.base_url(), client.base_url());
    }

    #[test]
    fn test_parse_sign_in_response() {
        let json = r#"{"accessToken": "tok", "user": {"id": 8, "email": "a@b.c", "churchId": 2}}"#;
        let resp: SignInResponse = serde_json::from_str(json).expect("Failed to parse sign-in JSON");
        assert_eq!(resp.access_token, "tok");
        assert_eq!(resp.user.id, 8);
        assert_eq!(resp.user.church_id, Some(2));
    }

    #[test]
    fn test_role_request_omits_missing_parent() {
        let root = serde_json::to_value(RoleRequest {
            name: "Pastor",
            parent_role_id: None,
        })
        .expect("serialize");
        assert_eq!(root, serde_json::json!({"name": "Pastor"}));

        let child = serde_json::to_value(RoleRequest {
            name: "Host",
            parent_role_id: Some(4),
        })
        .expect("serialize");
        assert_eq!(child, serde_json::json!({"name": "Host", "parentRoleId": 4}));
    }

    // ===== Against a local server =====

    fn groups_page() -> serde_json::Value {
        json!({
            "content": [
                {"id": 1, "name": "Vila Mariana", "latitude": -23.59, "longitude": -46.63},
                {"id": 2, "name": "Copacabana", "latitude": -22.97, "longitude": -43.18},
                {"id": 3, "name": "Online"}
            ],
            "totalElements": 3,
            "totalPages": 1,
            "number": 0,
            "size": 500
        })
    }

    #[tokio::test]
    async fn test_groups_in_bounds_reads_paged_envelope() {
        let server = TestServer::start().await;
        server.json(Method::GET, "/groups", StatusCode::OK, groups_page());

        let bounds = GeoBounds::around(-23.55, -46.63, 0.2);
        let groups = server
            .client()
            .fetch_groups_in_bounds(&bounds)
            .await
            .expect("groups in bounds");
        let ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1]);

        let requests = server.requests();
        let query = requests[0].query.as_deref().unwrap_or_default();
        assert!(query.contains("north="));
        assert!(query.contains("west="));
    }

    #[tokio::test]
    async fn test_meetings_requested_newest_first() {
        let server = TestServer::start().await;
        server.json(
            Method::GET,
            "/groups/4/meetings",
            StatusCode::OK,
            json!({"content": [{"id": 12, "date": "2026-03-05"}], "totalElements": 1, "totalPages": 1}),
        );

        let page = server.client().fetch_meetings(4, 0, 10).await.expect("meetings");
        assert_eq!(page.content[0].id, 12);

        let requests = server.requests();
        let query = requests[0].query.as_deref().unwrap_or_default();
        assert!(query.contains("sort=date"));
        assert!(query.contains("desc"));
    }

    #[tokio::test]
    async fn test_sign_in_builds_session() {
        let server = TestServer::start().await;
        server.json(
            Method::POST,
            "/auth/sign-in",
            StatusCode::OK,
            json!({"accessToken": "jwt", "user": {"id": 8, "churchId": 2}}),
        );

        let session = server
            .client()
            .authenticate("ana@igreja.org", "secret")
            .await
            .expect("sign in");
        assert_eq!(session.token, "jwt");
        assert_eq!(session.church_id, Some(2));
        assert_eq!(
            server.requests()[0].body,
            Some(json!({"email": "ana@igreja.org", "password": "secret"}))
        );
    }

    #[tokio::test]
    async fn test_set_attendance_puts_status() {
        let server = TestServer::start().await;
        server.empty(Method::PUT, "/groups/4/meetings/40/attendance", StatusCode::NO_CONTENT);

        server
            .client()
            .set_attendance(4, 40, 5, AttendanceStatus::Present)
            .await
            .expect("mark attendance");

        let requests = server.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].body, Some(json!({"personId": 5, "status": "PRESENT"})));
    }

    #[tokio::test]
    async fn test_error_statuses_surface_as_api_errors() {
        let server = TestServer::start().await;
        server.json(Method::GET, "/groups/9", StatusCode::UNAUTHORIZED, json!({"error": "expired"}));
        let client = server.client();

        let err = client.fetch_group(9).await.unwrap_err();
        assert!(crate::api::is_unauthorized(&err));

        let err = client.fetch_group(10).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_))));
    }
}
