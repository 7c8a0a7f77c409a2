//! REST API client module for Knowify services.
//!
//! This module provides the `ApiClient` for the three vendor calls the
//! service relies on: login, the project status listing and the reporting
//! search used to resolve a single project.
//!
//! Knowify authenticates with a `kAuth` cookie which is also echoed back in
//! a `kauth` request header.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginOutcome};
pub use error::{ApiError, Operation};
