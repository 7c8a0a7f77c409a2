//! Core library for the Knowify rejected-projects service.
//!
//! This crate contains everything that does not depend on the HTTP front end:
//!
//! - `api`: the vendor client for Knowify's login, status and search endpoints
//! - `auth`: session persistence and the tiered authentication decision
//! - `models`: vendor payload and domain types
//! - `rejected`: the "latest 3 rejected projects" aggregation
//! - `config`: configuration loading
//!
//! The [`Knowify`] context ties these together and is meant to be built once
//! per process and shared by request handlers.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod rejected;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthManager, AuthMethod, Authenticated, Credentials, Session, SessionStore};
pub use config::Config;
pub use models::ProjectDetail;
pub use rejected::{Knowify, RejectedProjects, RejectedProjectsError};
