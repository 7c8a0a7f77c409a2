use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Which kind of vendor call produced an error.
///
/// Login failures read "Login ..." and every other call reads "Request ...",
/// matching the messages surfaced to HTTP callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    StatusIds,
    ProjectDetail,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Login => f.write_str("Login"),
            Operation::StatusIds | Operation::ProjectDetail => f.write_str("Request"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{op} failed with status code: {code}{suffix}", code = .status.as_u16(), suffix = body_suffix(.body))]
    Status {
        op: Operation,
        status: StatusCode,
        body: String,
    },

    #[error("{op} error: {source}")]
    Transport {
        op: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{op} error: invalid response: {reason}")]
    InvalidResponse { op: Operation, reason: String },

    #[error("Project not found")]
    ProjectNotFound,

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({})", ApiError::truncate_body(body))
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(op: Operation, status: StatusCode, body: String) -> Self {
        ApiError::Status { op, status, body }
    }

    pub fn transport(op: Operation) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ApiError::Transport { op, source }
    }

    /// Raw upstream body for status failures, kept for diagnosis.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
