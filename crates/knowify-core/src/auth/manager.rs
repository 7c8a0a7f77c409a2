use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

use super::{Credentials, Session, SessionStore};

/// Which tier produced a usable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Session,
    FreshLogin,
    SavedCredentials,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Session => "session",
            AuthMethod::FreshLogin => "fresh_login",
            AuthMethod::SavedCredentials => "saved_credentials",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: Session,
    pub method: AuthMethod,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No valid session found and no credentials provided")]
    NoCredentials,

    #[error("{source}")]
    Login {
        method: AuthMethod,
        #[source]
        source: ApiError,
    },
}

impl AuthError {
    /// Tier that was attempted, if any
    pub fn method(&self) -> Option<AuthMethod> {
        match self {
            AuthError::NoCredentials => None,
            AuthError::Login { method, .. } => Some(*method),
        }
    }
}

/// Decides how to obtain a usable session for each request.
///
/// Tiers, first success wins:
/// 1. the stored session, if a status listing made with it succeeds
/// 2. a fresh login with caller-supplied credentials
/// 3. a login with the credentials remembered in the stored session
///
/// A tier that is attempted and fails is terminal; there are no retries.
/// Session-file access is serialised within the process by an internal lock.
pub struct AuthManager {
    client: ApiClient,
    store: SessionStore,
    lock: Mutex<()>,
}

impl AuthManager {
    pub fn new(client: ApiClient, store: SessionStore) -> Self {
        Self {
            client,
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn ensure_authenticated(&self, credentials: Option<Credentials>) -> Result<Authenticated, AuthError> {
        let _guard = self.lock.lock().await;

        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        };

        if let Some(ref session) = stored {
            match self.client.list_status_ids(session).await {
                Ok(_) => {
                    info!(method = %AuthMethod::Session, "Authenticated using saved session");
                    return Ok(Authenticated {
                        session: session.clone(),
                        method: AuthMethod::Session,
                        message: "Authenticated using saved session".to_string(),
                    });
                }
                Err(e) => info!(error = %e, "Saved session expired, attempting login"),
            }
        }

        if let Some(credentials) = credentials {
            return self.login(credentials, AuthMethod::FreshLogin).await;
        }

        let remembered = stored
            .and_then(|s| s.credentials)
            .filter(|c| !c.username.is_empty() && !c.password.is_empty());
        if let Some(credentials) = remembered {
            return self.login(credentials, AuthMethod::SavedCredentials).await;
        }

        warn!("No valid session found and no credentials provided");
        Err(AuthError::NoCredentials)
    }

    async fn login(&self, credentials: Credentials, method: AuthMethod) -> Result<Authenticated, AuthError> {
        let outcome = self
            .client
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(|source| {
                warn!(%method, error = %source, "Login failed");
                AuthError::Login { method, source }
            })?;

        // A failed save only costs a re-login on the next request
        self.store.save(&outcome.session);
        info!(%method, username = %credentials.username, "Logged in");

        Ok(Authenticated {
            session: outcome.session,
            method,
            message: outcome.message,
        })
    }
}
