//! API client for the Knowify REST endpoints.
//!
//! This module provides the `ApiClient` struct for the three calls the
//! service needs: logging in, listing project status buckets and resolving a
//! single project through the reporting search.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Client, Response, StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{Credentials, Session};
use crate::models::{ProjectDetail, ProjectRef, ProjectSearchResponse, StatusFilter};

use super::{ApiError, Operation};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for login and project listing endpoints
pub const API_BASE_URL: &str = "https://api.knowify.com";

/// Base URL for the reporting search endpoints
pub const REPORTING_BASE_URL: &str = "https://reporting.knowify.com";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Browser fingerprint the vendor expects on every call
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36";
const ORIGIN: &str = "https://secure.knowify.com";
const REFERER: &str = "https://secure.knowify.com/";
const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Header carrying the auth token alongside the cookie
const KAUTH_HEADER: &str = "kauth";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "UserName")]
    user_name: &'a str,
    #[serde(rename = "Password")]
    password: &'a str,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    pub message: String,
    /// Parsed response body, `None` when the vendor sent an empty body
    pub payload: Option<Value>,
}

/// API client for Knowify.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
/// The client holds no session state; every authenticated call takes the
/// session to use.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    api_base_url: String,
    reporting_base_url: String,
}

impl ApiClient {
    /// Create a client against the production endpoints
    pub fn new() -> Result<Self> {
        Self::with_base_urls(API_BASE_URL, REPORTING_BASE_URL)
    }

    /// Create a client against custom base URLs (staging, tests)
    pub fn with_base_urls(api_base_url: &str, reporting_base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            reporting_base_url: reporting_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn reporting_base_url(&self) -> &str {
        &self.reporting_base_url
    }

    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::ORIGIN, HeaderValue::from_static(ORIGIN));
        headers.insert(header::REFERER, HeaderValue::from_static(REFERER));
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers
    }

    /// Extra fingerprint headers the reporting host checks
    fn reporting_headers() -> HeaderMap {
        let mut headers = Self::browser_headers();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,ar-TN;q=0.8,ar;q=0.7"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        let extra = [
            ("priority", "u=1, i"),
            ("sec-ch-ua", "\"Google Chrome\";v=\"141\", \"Not?A_Brand\";v=\"8\", \"Chromium\";v=\"141\""),
            ("sec-ch-ua-mobile", "?0"),
            ("sec-ch-ua-platform", "\"Windows\""),
            ("sec-fetch-dest", "empty"),
            ("sec-fetch-mode", "cors"),
            ("sec-fetch-site", "same-site"),
        ];
        for (name, value) in extra {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        headers
    }

    /// Cookie and `kauth` headers for an authenticated call.
    /// `always_kauth` sends an empty `kauth` when the session has no token.
    fn session_headers(session: &Session, always_kauth: bool) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session.cookie_header() {
            headers.insert(header::COOKIE, HeaderValue::from_str(&cookie)?);
        }
        match session.token() {
            Some(token) => {
                headers.insert(HeaderName::from_static(KAUTH_HEADER), HeaderValue::from_str(token)?);
            }
            None if always_kauth => {
                headers.insert(HeaderName::from_static(KAUTH_HEADER), HeaderValue::from_static(""));
            }
            None => {}
        }
        Ok(headers)
    }

    /// Check the response is a 200, returning an error with the body if not.
    async fn check_response(op: Operation, response: Response) -> Result<Response, ApiError> {
        if response.status() == StatusCode::OK {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                operation = ?op,
                status = status.as_u16(),
                body = %ApiError::truncate_body(&body),
                "Vendor call failed"
            );
            Err(ApiError::from_status(op, status, body))
        }
    }

    async fn read_body(op: Operation, response: Response) -> Result<String, ApiError> {
        response.text().await.map_err(ApiError::transport(op))
    }

    fn parse_json<T: serde::de::DeserializeOwned>(op: Operation, body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse {
            op,
            reason: e.to_string(),
        })
    }

    // ===== Vendor Calls =====

    /// Log in and capture the session cookies set by the response.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let op = Operation::Login;
        let url = format!("{}/account/login", self.api_base_url);

        let response = self
            .client
            .post(&url)
            .headers(Self::browser_headers())
            .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(&LoginRequest {
                user_name: username,
                password,
            })
            .send()
            .await
            .map_err(ApiError::transport(op))?;

        let response = Self::check_response(op, response).await?;

        let cookies: BTreeMap<String, String> = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();

        let body = Self::read_body(op, response).await?;
        let payload = if body.trim().is_empty() {
            None
        } else {
            Some(Self::parse_json::<Value>(op, &body)?)
        };

        let session = Session::from_login(cookies, Credentials::new(username, password));
        debug!(
            cookie_count = session.cookies.len(),
            has_token = session.auth_token.is_some(),
            "Login response accepted"
        );

        Ok(LoginOutcome {
            session,
            message: "Login successful".to_string(),
            payload,
        })
    }

    /// Fetch the project status buckets. The whole payload is returned;
    /// rejected projects live under `Data.Status.IdsLost`.
    pub async fn list_status_ids(&self, session: &Session) -> Result<Value, ApiError> {
        let op = Operation::StatusIds;
        let url = format!("{}/Projects/projectsStatusIds", self.api_base_url);

        let response = self
            .client
            .post(&url)
            .headers(Self::browser_headers())
            .headers(Self::session_headers(session, false)?)
            .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(&StatusFilter::default())
            .send()
            .await
            .map_err(ApiError::transport(op))?;

        let response = Self::check_response(op, response).await?;
        let body = Self::read_body(op, response).await?;
        Self::parse_json(op, &body)
    }

    /// Resolve a single project through the reporting search.
    pub async fn get_project_detail(&self, session: &Session, id: &ProjectRef) -> Result<ProjectDetail, ApiError> {
        let op = Operation::ProjectDetail;
        let url = format!("{}/api/meta/search/projects", self.reporting_base_url);
        let query = serde_json::json!({ "Id": { "$eq": id.as_str() } }).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("page_size", "1"), ("query", query.as_str())])
            .headers(Self::reporting_headers())
            .headers(Self::session_headers(session, true)?)
            .send()
            .await
            .map_err(ApiError::transport(op))?;

        let response = Self::check_response(op, response).await?;
        let body = Self::read_body(op, response).await?;
        let search: ProjectSearchResponse = Self::parse_json(op, &body)?;

        search.into_detail().ok_or_else(|| {
            debug!(project_id = %id, "Project search returned no record");
            ApiError::ProjectNotFound
        })
    }
}
