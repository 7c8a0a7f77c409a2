use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Name used when a project's details could not be fetched
pub const PLACEHOLDER_PROJECT_NAME: &str = "Unable to fetch";

/// Earliest date the status listing is asked to cover
const STATUS_START_DATE: &str = "2011-04-11T19:57:41.278Z";

/// Project id as handed out by the vendor.
/// Ids arrive as JSON strings or numbers depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectRef(pub String);

impl ProjectRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectRef {
    fn from(s: &str) -> Self {
        ProjectRef(s.to_string())
    }
}

impl<'de> Deserialize<'de> for ProjectRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(ProjectRef(s)),
            Value::Number(n) => Ok(ProjectRef(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected a string or numeric project id, got {}",
                other
            ))),
        }
    }
}

/// Normalised project record returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectDetail {
    #[serde(default)]
    pub project_id: Option<ProjectRef>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub date_used: Option<String>,
}

impl ProjectDetail {
    /// Stand-in record for a project whose lookup failed
    pub fn placeholder(id: &ProjectRef) -> Self {
        Self {
            project_id: Some(id.clone()),
            project_name: Some(PLACEHOLDER_PROJECT_NAME.to_string()),
            date_used: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.project_name.as_deref() == Some(PLACEHOLDER_PROJECT_NAME) && self.date_used.is_none()
    }
}

/// Envelope of the reporting search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSearchResponse {
    #[serde(rename = "DidSucceed", default)]
    pub did_succeed: bool,
    #[serde(rename = "Data", default)]
    pub data: Option<Value>,
}

impl ProjectSearchResponse {
    /// The project record, if the search succeeded and returned a non-empty object
    pub fn into_detail(self) -> Option<ProjectDetail> {
        if !self.did_succeed {
            return None;
        }
        match self.data {
            Some(Value::Object(map)) if !map.is_empty() => {
                serde_json::from_value(Value::Object(map)).ok()
            }
            _ => None,
        }
    }
}

/// Fixed filter posted to the status listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusFilter {
    pub page: u32,
    pub page_size: u32,
    pub sort: &'static str,
    pub sort_asc: bool,
    pub for_client: bool,
    pub limit_to_project_leaders: bool,
    pub search: &'static str,
    pub project_status: Option<String>,
    pub start_date: &'static str,
    pub end_date: Option<String>,
    pub include_closed: bool,
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            sort: "DateUsed",
            sort_asc: false,
            for_client: true,
            limit_to_project_leaders: false,
            search: "",
            project_status: None,
            start_date: STATUS_START_DATE,
            end_date: None,
            include_closed: true,
        }
    }
}
