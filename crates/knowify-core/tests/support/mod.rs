//! In-process stand-in for the Knowify endpoints.
//!
//! Serves the login, status listing and reporting search routes on an
//! ephemeral localhost port so the real client can be exercised end to end.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub const USERNAME: &str = "pm@example.com";
pub const PASSWORD: &str = "hunter2";

pub struct FakeVendor {
    status_payload: Mutex<Value>,
    failing_ids: Mutex<HashSet<String>>,
    valid_tokens: Mutex<HashSet<String>>,
    status_down: AtomicBool,
    next_token: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl FakeVendor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            status_payload: Mutex::new(Self::status_with(&["p1", "p2", "p3"])),
            failing_ids: Mutex::new(HashSet::new()),
            valid_tokens: Mutex::new(HashSet::new()),
            status_down: AtomicBool::new(false),
            next_token: AtomicUsize::new(1),
            login_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        })
    }

    pub fn status_with(ids: &[&str]) -> Value {
        json!({
            "Data": {
                "Status": {
                    "IdsActive": ["a1"],
                    "IdsLost": ids,
                }
            }
        })
    }

    pub fn set_status_payload(&self, payload: Value) {
        *self.status_payload.lock().unwrap() = payload;
    }

    pub fn set_lost_ids(&self, ids: &[&str]) {
        self.set_status_payload(Self::status_with(ids));
    }

    /// Make detail lookups for `id` answer with a server error
    pub fn fail_detail(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    /// Make the status listing answer 503 for everyone
    pub fn take_status_down(&self) {
        self.status_down.store(true, Ordering::SeqCst);
    }

    /// Invalidate every token issued so far
    pub fn expire_sessions(&self) {
        self.valid_tokens.lock().unwrap().clear();
    }

    pub fn logins(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    /// Date the fake reports for a project; deliberately unrelated to list order
    pub fn date_for(id: &str) -> String {
        let day = id.bytes().map(|b| b as u32).sum::<u32>() % 28 + 1;
        format!("2024-02-{:02}T10:00:00", day)
    }

    pub async fn spawn(self: &Arc<Self>) -> String {
        let app = Router::new()
            .route("/account/login", post(login))
            .route("/Projects/projectsStatusIds", post(status_ids))
            .route("/api/meta/search/projects", get(search_projects))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(token) = headers.get("kauth").and_then(|v| v.to_str().ok()) else {
            return false;
        };
        let cookie_ok = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|c| c.split("; ").any(|pair| pair == format!("kAuth={}", token)))
            .unwrap_or(false);
        cookie_ok && self.valid_tokens.lock().unwrap().contains(token)
    }
}

/// Base URL of a port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn login(State(vendor): State<Arc<FakeVendor>>, Json(body): Json<Value>) -> Response {
    vendor.login_calls.fetch_add(1, Ordering::SeqCst);

    if body["UserName"] != USERNAME || body["Password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, "Invalid username or password").into_response();
    }

    let n = vendor.next_token.fetch_add(1, Ordering::SeqCst);
    let token = format!("tok-{}", n);
    vendor.valid_tokens.lock().unwrap().insert(token.clone());

    (
        AppendHeaders([
            (header::SET_COOKIE, format!("kAuth={}; Path=/; Secure", token)),
            (header::SET_COOKIE, format!("ASP.NET_SessionId=s-{}; Path=/; HttpOnly", n)),
        ]),
        Json(json!({"Succeeded": true, "UserName": USERNAME})),
    )
        .into_response()
}

async fn status_ids(
    State(vendor): State<Arc<FakeVendor>>,
    headers: HeaderMap,
    Json(filter): Json<Value>,
) -> Response {
    vendor.status_calls.fetch_add(1, Ordering::SeqCst);

    if vendor.status_down.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "Maintenance").into_response();
    }
    if !vendor.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Session expired").into_response();
    }
    if filter["Sort"] != "DateUsed" || filter["PageSize"] != 20 {
        return (StatusCode::BAD_REQUEST, "Unexpected filter").into_response();
    }

    let payload = vendor.status_payload.lock().unwrap().clone();
    Json(payload).into_response()
}

async fn search_projects(
    State(vendor): State<Arc<FakeVendor>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    vendor.detail_calls.fetch_add(1, Ordering::SeqCst);

    if !vendor.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Session expired").into_response();
    }

    let query: Value = params
        .get("query")
        .and_then(|q| serde_json::from_str(q).ok())
        .unwrap_or(Value::Null);
    let Some(id) = query["Id"]["$eq"].as_str().map(str::to_string) else {
        return (StatusCode::BAD_REQUEST, "Missing Id filter").into_response();
    };

    if vendor.failing_ids.lock().unwrap().contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    if id.starts_with("missing") {
        return Json(json!({"DidSucceed": false, "Data": null})).into_response();
    }

    Json(json!({
        "DidSucceed": true,
        "Data": {
            "ProjectId": id,
            "ProjectName": format!("Project {}", id),
            "DateUsed": FakeVendor::date_for(&id),
            "ClientName": "ACME"
        }
    }))
    .into_response()
}
