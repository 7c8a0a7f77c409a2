//! Authentication module for managing Knowify sessions and credentials.
//!
//! This module provides:
//! - `Session` / `SessionStore`: the cookie, token and credential bundle and
//!   its single on-disk file
//! - `sealed`: optional passphrase encryption of that file
//! - `AuthManager`: the tiered decision between a stored session, fresh
//!   credentials and remembered credentials
//!
//! Sessions carry no expiry. Whether a stored session still works is only
//! known by probing the vendor with it.

pub mod manager;
pub mod sealed;
pub mod session;

pub use manager::{AuthError, AuthManager, AuthMethod, Authenticated};
pub use session::{Credentials, Session, SessionError, SessionStore};
