use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use knowify_core::{
    AuthMethod, Credentials, Knowify, ProjectDetail, RejectedProjects, RejectedProjectsError,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub knowify: Arc<Knowify>,
}

impl AppState {
    pub fn new(knowify: Knowify) -> Self {
        Self {
            knowify: Arc::new(knowify),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/get_rejected_projects", get(get_rejected_projects))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RejectedProjectsResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_method: Option<AuthMethod>,
    rejected_projects: Vec<ProjectDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_data: Option<Value>,
}

impl From<RejectedProjects> for RejectedProjectsResponse {
    fn from(result: RejectedProjects) -> Self {
        Self {
            success: true,
            message: result.message,
            auth_method: Some(result.auth_method),
            count: Some(result.projects.len()),
            rejected_projects: result.projects,
            raw_data: None,
        }
    }
}

impl From<&RejectedProjectsError> for RejectedProjectsResponse {
    fn from(err: &RejectedProjectsError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            auth_method: None,
            rejected_projects: Vec::new(),
            count: None,
            raw_data: err.raw_data().cloned(),
        }
    }
}

fn status_for(err: &RejectedProjectsError) -> StatusCode {
    match err {
        RejectedProjectsError::Auth(_) => StatusCode::UNAUTHORIZED,
        RejectedProjectsError::Retrieval(_) | RejectedProjectsError::MissingKey { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// First non-empty value among a parameter and its alias
fn query_param<'a>(params: &'a HashMap<String, String>, name: &str, alias: &str) -> Option<&'a str> {
    [name, alias]
        .iter()
        .filter_map(|key| params.get(*key))
        .map(String::as_str)
        .find(|v| !v.is_empty())
}

async fn get_rejected_projects(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let credentials = Credentials::from_parts(
        query_param(&params, "username", "UserName"),
        query_param(&params, "password", "Password"),
    );

    match state.knowify.latest_rejected_projects(credentials).await {
        Ok(result) => {
            info!(
                auth_method = %result.auth_method,
                count = result.projects.len(),
                "Rejected projects served"
            );
            (StatusCode::OK, Json(RejectedProjectsResponse::from(result)))
        }
        Err(e) => {
            let status = status_for(&e);
            warn!(status = status.as_u16(), error = %e, "Rejected projects request failed");
            (status, Json(RejectedProjectsResponse::from(&e)))
        }
    }
}

async fn home() -> impl IntoResponse {
    Json(json!({
        "name": "Knowify API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/get_rejected_projects": {
                "method": "GET",
                "description": "Login to Knowify and retrieve latest 3 rejected projects with details",
                "query_parameters": {
                    "username": "your_username (optional if session exists)",
                    "password": "your_password (optional if session exists)"
                },
                "example": "/get_rejected_projects?username=your_username&password=your_password",
                "response": {
                    "success": "boolean",
                    "message": "string",
                    "auth_method": "session|fresh_login|saved_credentials",
                    "rejected_projects": "array of objects with ProjectId, ProjectName, DateUsed",
                    "count": "number of rejected projects (max 3)"
                },
                "notes": "Returns latest 3 rejected projects. First request requires credentials. Subsequent requests use saved session automatically."
            }
        }
    }))
}
