//! The "latest rejected projects" workflow.
//!
//! Rejected projects are the ones Knowify files under the `IdsLost` status
//! bucket. The vendor's order is kept as-is; ids are never re-sorted by date.

use anyhow::Context;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{AuthError, AuthManager, AuthMethod, Credentials, SessionStore};
use crate::config::Config;
use crate::models::{ProjectDetail, ProjectRef};

/// How many rejected projects are resolved per request
pub const MAX_REJECTED_PROJECTS: usize = 3;

/// Key path of the rejected bucket inside the status payload
const IDS_LOST_PATH: [&str; 3] = ["Data", "Status", "IdsLost"];

#[derive(Debug, Clone)]
pub struct RejectedProjects {
    pub message: String,
    pub auth_method: AuthMethod,
    pub projects: Vec<ProjectDetail>,
}

#[derive(Error, Debug)]
pub enum RejectedProjectsError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed to retrieve projects: {0}")]
    Retrieval(#[source] ApiError),

    #[error("Could not find IdsLost in response: {reason}")]
    MissingKey { reason: String, raw: Value },
}

impl RejectedProjectsError {
    /// Upstream payload attached for diagnosis, if any
    pub fn raw_data(&self) -> Option<&Value> {
        match self {
            RejectedProjectsError::MissingKey { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Pull the first `limit` rejected ids out of a status payload.
/// The error names the offending key.
pub fn extract_rejected_ids(payload: &Value, limit: usize) -> Result<Vec<ProjectRef>, String> {
    let mut node = payload;
    for key in IDS_LOST_PATH {
        node = node.get(key).ok_or_else(|| format!("'{}'", key))?;
    }

    let ids = node
        .as_array()
        .ok_or_else(|| "'IdsLost' is not a list".to_string())?;

    ids.iter()
        .take(limit)
        .map(|v| ProjectRef::deserialize(v).map_err(|e| format!("'IdsLost' entry {}: {}", v, e)))
        .collect()
}

/// Service context: one vendor client and one auth manager per process,
/// handed to request handlers explicitly.
pub struct Knowify {
    client: ApiClient,
    auth: AuthManager,
}

impl Knowify {
    pub fn new(client: ApiClient, store: SessionStore) -> Self {
        let auth = AuthManager::new(client.clone(), store);
        Self { client, auth }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = ApiClient::with_base_urls(&config.api_base_url, &config.reporting_base_url)
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client, config.session_store()))
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Authenticate, list status buckets and resolve the first rejected projects.
    ///
    /// Detail lookups run concurrently; a failed lookup yields a placeholder
    /// record instead of failing the batch.
    pub async fn latest_rejected_projects(
        &self,
        credentials: Option<Credentials>,
    ) -> Result<RejectedProjects, RejectedProjectsError> {
        let authenticated = self.auth.ensure_authenticated(credentials).await?;

        let payload = self
            .client
            .list_status_ids(&authenticated.session)
            .await
            .map_err(RejectedProjectsError::Retrieval)?;

        let ids = match extract_rejected_ids(&payload, MAX_REJECTED_PROJECTS) {
            Ok(ids) => ids,
            Err(reason) => {
                warn!(%reason, "Status payload missing rejected bucket");
                return Err(RejectedProjectsError::MissingKey { reason, raw: payload });
            }
        };
        debug!(count = ids.len(), "Resolving rejected projects");

        let session = &authenticated.session;
        let lookups = ids.iter().map(|id| async move {
            match self.client.get_project_detail(session, id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(project_id = %id, error = %e, "Project lookup failed, using placeholder");
                    ProjectDetail::placeholder(id)
                }
            }
        });
        let projects = join_all(lookups).await;

        Ok(RejectedProjects {
            message: format!(
                "Latest {} rejected projects retrieved successfully",
                MAX_REJECTED_PROJECTS
            ),
            auth_method: authenticated.method,
            projects,
        })
    }
}
