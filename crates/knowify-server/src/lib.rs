//! HTTP front end for the Knowify rejected-projects service.
//!
//! Exposes a self-describing `GET /` and `GET /get_rejected_projects`, which
//! authenticates against Knowify and returns the latest rejected projects.

pub mod logging;
pub mod routes;

pub use routes::{router, AppState};
