mod support;

use std::sync::Arc;

use knowify_core::models::ProjectRef;
use knowify_core::{ApiClient, AuthMethod, Credentials, Knowify, RejectedProjectsError, SessionStore};
use serde_json::json;
use support::{FakeVendor, PASSWORD, USERNAME};
use tempfile::TempDir;

async fn knowify_for(vendor: &Arc<FakeVendor>) -> (Knowify, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = vendor.spawn().await;
    let client = ApiClient::with_base_urls(&url, &url).unwrap();
    let knowify = Knowify::new(client, SessionStore::new(dir.path().join("session.json")));
    (knowify, dir)
}

fn creds() -> Option<Credentials> {
    Some(Credentials::new(USERNAME, PASSWORD))
}

fn ids_of(projects: &[knowify_core::ProjectDetail]) -> Vec<String> {
    projects
        .iter()
        .map(|p| p.project_id.as_ref().map(|id| id.to_string()).unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_returns_first_three_in_vendor_order() {
    let vendor = FakeVendor::new();
    vendor.set_lost_ids(&["p5", "p1", "p4", "p2", "p3"]);
    let (knowify, _dir) = knowify_for(&vendor).await;

    let result = knowify.latest_rejected_projects(creds()).await.unwrap();
    assert_eq!(result.message, "Latest 3 rejected projects retrieved successfully");
    assert_eq!(result.auth_method, AuthMethod::FreshLogin);
    assert_eq!(ids_of(&result.projects), vec!["p5", "p1", "p4"]);
    assert_eq!(result.projects[1].date_used, Some(FakeVendor::date_for("p1")));
    assert_eq!(vendor.detail_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failed_lookup_becomes_placeholder() {
    let vendor = FakeVendor::new();
    vendor.set_lost_ids(&["p1", "p2", "p3"]);
    vendor.fail_detail("p2");
    let (knowify, _dir) = knowify_for(&vendor).await;

    let result = knowify.latest_rejected_projects(creds()).await.unwrap();
    assert_eq!(result.projects.len(), 3);
    assert_eq!(ids_of(&result.projects), vec!["p1", "p2", "p3"]);

    let failed = &result.projects[1];
    assert!(failed.is_placeholder());
    assert_eq!(failed.project_name.as_deref(), Some("Unable to fetch"));
    assert_eq!(failed.date_used, None);
    assert!(!result.projects[0].is_placeholder());
}

#[tokio::test]
async fn test_fewer_than_three_rejected() {
    let vendor = FakeVendor::new();
    vendor.set_lost_ids(&["missing-7"]);
    let (knowify, _dir) = knowify_for(&vendor).await;

    let result = knowify.latest_rejected_projects(creds()).await.unwrap();
    assert_eq!(result.projects.len(), 1);
    assert_eq!(result.projects[0].project_id, Some(ProjectRef::from("missing-7")));
    assert!(result.projects[0].is_placeholder());
}

#[tokio::test]
async fn test_second_call_reuses_session() {
    let vendor = FakeVendor::new();
    let (knowify, _dir) = knowify_for(&vendor).await;

    knowify.latest_rejected_projects(creds()).await.unwrap();
    let result = knowify.latest_rejected_projects(None).await.unwrap();
    assert_eq!(result.auth_method, AuthMethod::Session);
    assert_eq!(vendor.logins(), 1);
}

#[tokio::test]
async fn test_missing_bucket_reports_raw_payload() {
    let vendor = FakeVendor::new();
    vendor.set_status_payload(json!({"Data": {"Counts": {"Lost": 4}}}));
    let (knowify, _dir) = knowify_for(&vendor).await;

    let err = knowify.latest_rejected_projects(creds()).await.unwrap_err();
    assert_eq!(err.to_string(), "Could not find IdsLost in response: 'Status'");
    assert_eq!(err.raw_data(), Some(&json!({"Data": {"Counts": {"Lost": 4}}})));
}

#[tokio::test]
async fn test_auth_failure_is_reported() {
    let vendor = FakeVendor::new();
    let (knowify, _dir) = knowify_for(&vendor).await;

    let err = knowify.latest_rejected_projects(None).await.unwrap_err();
    assert!(matches!(err, RejectedProjectsError::Auth(_)));
    assert_eq!(
        err.to_string(),
        "Authentication failed: No valid session found and no credentials provided"
    );
    assert_eq!(vendor.status_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}
