//! Error responses.
//!
//! # Responsibilities
//! - Map dispatch failures to HTTP status codes
//! - Render plain-text error bodies
//!
//! # Design Decisions
//! - Unsupported clients are a client error (406), never a 5xx
//! - Path and open failures are 500 with the underlying message; a
//!   missing file is not told apart from other open failures

use std::io;

use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routing::PathError;

pub const UNSUPPORTED_MESSAGE: &str = "This browser is not supported";

/// Why a request ended before content was served.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No build's requirement holds for the client.
    #[error("{}", UNSUPPORTED_MESSAGE)]
    Unsupported,

    #[error("{0}")]
    InvalidPath(#[from] PathError),

    #[error("{0}")]
    Open(#[source] io::Error),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Unsupported => StatusCode::NOT_ACCEPTABLE,
            DispatchError::InvalidPath(_) | DispatchError::Open(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        plain_text(self.status(), self.to_string())
    }
}

/// A `text/plain` response that browsers will not sniff.
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        body.into(),
    )
        .into_response()
}
