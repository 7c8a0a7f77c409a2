//! Data models for Knowify payloads.
//!
//! - `ProjectDetail`: the normalised record returned to callers
//! - `ProjectRef`: an opaque project id from the status buckets
//! - `StatusFilter`: the fixed filter sent to the status listing

pub mod project;

pub use project::{ProjectDetail, ProjectRef, ProjectSearchResponse, StatusFilter};
