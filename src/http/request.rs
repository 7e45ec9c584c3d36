//! Request inspection.
//!
//! # Responsibilities
//! - Generate and propagate a unique request ID (UUID v4)
//! - Extract the client identity string (User-Agent)
//! - Determine the effective scheme and host of the request
//!
//! # Design Decisions
//! - Request ID added by the outermost layer so every log line has it
//! - `X-Forwarded-Proto` wins over connection state: TLS usually ends at
//!   a proxy in front of this server
//! - Header values that are not visible ASCII are treated as absent

use axum::http::header::{HOST, USER_AGENT};
use axum::http::request::Parts;
use axum::http::uri::Scheme;
use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Marker extension for requests that arrived over a secured connection.
///
/// Transports that terminate TLS in-process insert this into the request
/// extensions; requests in absolute-form with an `https` URI count too.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureConnection;

/// Layer assigning an `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

pub fn request_id(parts: &Parts) -> &str {
    header_str(parts, &X_REQUEST_ID).unwrap_or("unknown")
}

/// The client identity string. Missing or unreadable → empty.
pub fn user_agent(parts: &Parts) -> &str {
    header_str(parts, &USER_AGENT).unwrap_or("")
}

/// Scheme to qualify pushed resources with: forwarded header, then
/// connection security, then plain `http`.
pub fn effective_scheme(parts: &Parts) -> &str {
    if let Some(forwarded) = header_str(parts, &X_FORWARDED_PROTO).filter(|s| !s.is_empty()) {
        return forwarded;
    }
    if parts.extensions.get::<SecureConnection>().is_some()
        || parts.uri.scheme() == Some(&Scheme::HTTPS)
    {
        return "https";
    }
    "http"
}

/// Host the client addressed: `Host` header, else the URI authority
/// (HTTP/2 `:authority`), else empty.
pub fn request_host(parts: &Parts) -> &str {
    header_str(parts, &HOST)
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or("")
}

fn header_str<'a>(parts: &'a Parts, name: &HeaderName) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
