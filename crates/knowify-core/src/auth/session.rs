use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::sealed::{self, SealError, SealedEnvelope};

/// Name of the cookie carrying Knowify's auth token
pub const AUTH_COOKIE: &str = "kAuth";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sealed(#[from] SealError),
}

/// Username/password pair remembered from the last successful login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Build credentials from optional inputs; empty values count as absent
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Self::new(u, p)),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cookie, token and credential bundle captured at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from the cookies set by a login response.
    /// The auth token is always taken from the same cookie map.
    pub fn from_login(cookies: BTreeMap<String, String>, credentials: Credentials) -> Self {
        let auth_token = cookies.get(AUTH_COOKIE).cloned();
        Self {
            cookies,
            auth_token,
            credentials: Some(credentials),
            created_at: Utc::now(),
        }
    }

    /// Value for a `Cookie` request header, or `None` without cookies
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}

/// The single file holding the current session.
///
/// Plain JSON by default; sealed with [`sealed`] when a session key is set.
/// There is no file locking: one process is expected to own the file.
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    session_key: Option<String>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("path", &self.path)
            .field("sealed", &self.session_key.is_some())
            .finish()
    }
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            session_key: None,
        }
    }

    /// Encrypt the file with a key derived from `passphrase`
    pub fn with_session_key(mut self, passphrase: impl Into<String>) -> Self {
        self.session_key = Some(passphrase.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session from disk.
    /// A missing file is `Ok(None)`; anything unreadable is an error.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let session = match self.session_key {
            Some(ref key) => {
                let envelope: SealedEnvelope = serde_json::from_slice(&contents)?;
                let plain = sealed::open(key, &envelope)?;
                serde_json::from_slice(&plain)?
            }
            None => serde_json::from_slice(&contents)?,
        };

        debug!(path = %self.path.display(), "Session loaded");
        Ok(Some(session))
    }

    /// Write the session, replacing whatever was stored before.
    /// Failures are logged and reported as `false`.
    pub fn save(&self, session: &Session) -> bool {
        match self.try_save(session) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to save session");
                false
            }
        }
    }

    fn try_save(&self, session: &Session) -> Result<(), SessionError> {
        let contents = match self.session_key {
            Some(ref key) => {
                let plain = serde_json::to_vec(session)?;
                serde_json::to_vec_pretty(&sealed::seal(key, &plain)?)?
            }
            None => serde_json::to_vec_pretty(session)?,
        };

        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, contents).map_err(io_err)
    }

    /// Remove the session file if present
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
