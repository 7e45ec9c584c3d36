//! Content transfer for an opened file.
//!
//! # Responsibilities
//! - Infer `Content-Type` from the name, sniffing the first bytes when
//!   the name has no known extension
//! - Conditional requests (`If-Modified-Since`, `If-Unmodified-Since`)
//! - Single byte ranges (`Range`, `If-Range`)
//! - Stream the body without buffering the whole file
//!
//! # Design Decisions
//! - Headers already set by the caller (preload links, service worker
//!   scope) are kept on every response, including 304
//! - Multi-range requests get the whole file with 200
//! - Timestamps compare at one-second resolution, like HTTP dates
//! - The file moves into the body stream and is dropped when the body
//!   finishes; body-less responses drop it before returning

use std::io::{self, SeekFrom};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::header::{
    HeaderMap, HeaderValue, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
    IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, IF_UNMODIFIED_SINCE, LAST_MODIFIED, RANGE,
};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::http::response::plain_text;

const SNIFF_LEN: usize = 512;

/// Serve `file` as the response to a request for `name`.
///
/// `headers` are response headers the caller has already decided on.
pub async fn serve_content<F>(
    method: &Method,
    request_headers: &HeaderMap,
    name: &str,
    modified: SystemTime,
    file: F,
    headers: HeaderMap,
) -> Response
where
    F: AsyncRead + AsyncSeek + Send + Unpin + 'static,
{
    match try_serve(method, request_headers, name, modified, file, headers).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(name = %name, error = %e, "Failed to serve content");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn try_serve<F>(
    method: &Method,
    request_headers: &HeaderMap,
    name: &str,
    modified: SystemTime,
    mut file: F,
    mut headers: HeaderMap,
) -> io::Result<Response>
where
    F: AsyncRead + AsyncSeek + Send + Unpin + 'static,
{
    let size = file.seek(SeekFrom::End(0)).await?;
    file.seek(SeekFrom::Start(0)).await?;

    if !headers.contains_key(CONTENT_TYPE) {
        let content_type = match content_type_for(name) {
            Some(ct) => ct,
            None => {
                let mut buf = [0u8; SNIFF_LEN];
                let n = read_prefix(&mut file, &mut buf).await?;
                file.seek(SeekFrom::Start(0)).await?;
                sniff(&buf[..n])
            }
        };
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    let modified_secs = unix_secs(modified);
    if modified_secs.is_some_and(|s| s > 0) {
        if let Ok(v) = HeaderValue::from_str(&httpdate::fmt_http_date(modified)) {
            headers.insert(LAST_MODIFIED, v);
        }
    }

    if let Some(status) = check_preconditions(method, request_headers, modified_secs) {
        return Ok(empty(status, headers, status == StatusCode::NOT_MODIFIED));
    }

    let mut status = StatusCode::OK;
    let mut start = 0;
    let mut length = size;

    if let Some(range) = request_headers.get(RANGE).and_then(|v| v.to_str().ok()) {
        if if_range_allows(request_headers, modified_secs) {
            match parse_range(range, size) {
                Ok(Some((s, l))) => {
                    status = StatusCode::PARTIAL_CONTENT;
                    start = s;
                    length = l;
                    let content_range = format!("bytes {}-{}/{}", s, s + l - 1, size);
                    if let Ok(v) = HeaderValue::from_str(&content_range) {
                        headers.insert(CONTENT_RANGE, v);
                    }
                }
                Ok(None) => {}
                Err(RangeError::Invalid | RangeError::Unsatisfiable) => {
                    if let Ok(v) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                        headers.insert(CONTENT_RANGE, v);
                    }
                    headers.remove(CONTENT_TYPE);
                    return Ok(empty(StatusCode::RANGE_NOT_SATISFIABLE, headers, false));
                }
            }
        }
    }

    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        file.seek(SeekFrom::Start(start)).await?;
        Body::from_stream(ReaderStream::new(file.take(length)))
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn empty(status: StatusCode, mut headers: HeaderMap, strip_entity: bool) -> Response {
    if strip_entity {
        headers.remove(CONTENT_TYPE);
        headers.remove(CONTENT_LENGTH);
    }
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn unix_secs(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn header_date(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<u64> {
    let value = headers.get(name)?.to_str().ok()?;
    unix_secs(httpdate::parse_http_date(value).ok()?)
}

/// 412 or 304 when the request's preconditions say so.
fn check_preconditions(
    method: &Method,
    request_headers: &HeaderMap,
    modified_secs: Option<u64>,
) -> Option<StatusCode> {
    let modified = modified_secs.filter(|s| *s > 0)?;

    if let Some(since) = header_date(request_headers, IF_UNMODIFIED_SINCE) {
        if modified > since {
            return Some(StatusCode::PRECONDITION_FAILED);
        }
    }

    let readonly = method == Method::GET || method == Method::HEAD;
    if readonly && !request_headers.contains_key(IF_NONE_MATCH) {
        if let Some(since) = header_date(request_headers, IF_MODIFIED_SINCE) {
            if modified <= since {
                return Some(StatusCode::NOT_MODIFIED);
            }
        }
    }
    None
}

/// Without entity tags only a date `If-Range` can match.
fn if_range_allows(request_headers: &HeaderMap, modified_secs: Option<u64>) -> bool {
    if !request_headers.contains_key(IF_RANGE) {
        return true;
    }
    match (header_date(request_headers, IF_RANGE), modified_secs) {
        (Some(date), Some(modified)) => date == modified,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeError {
    Invalid,
    Unsatisfiable,
}

/// Parse a `Range` header into `(start, length)`.
///
/// `Ok(None)` means "serve the whole file" (several ranges requested).
fn parse_range(header: &str, size: u64) -> Result<Option<(u64, u64)>, RangeError> {
    let specs = header
        .strip_prefix("bytes=")
        .ok_or(RangeError::Invalid)?;

    let specs: Vec<&str> = specs
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    match specs.len() {
        0 => return Err(RangeError::Invalid),
        1 => {}
        _ => return Ok(None),
    }

    let (first, last) = specs[0].split_once('-').ok_or(RangeError::Invalid)?;
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix: the final N bytes.
        let n: u64 = last.parse().map_err(|_| RangeError::Invalid)?;
        if n == 0 || size == 0 {
            return Err(RangeError::Unsatisfiable);
        }
        let n = n.min(size);
        return Ok(Some((size - n, n)));
    }

    let start: u64 = first.parse().map_err(|_| RangeError::Invalid)?;
    if start >= size {
        return Err(RangeError::Unsatisfiable);
    }
    let end = if last.is_empty() {
        size - 1
    } else {
        let end: u64 = last.parse().map_err(|_| RangeError::Invalid)?;
        if end < start {
            return Err(RangeError::Invalid);
        }
        end.min(size - 1)
    };
    Ok(Some((start, end - start + 1)))
}

async fn read_prefix<F: AsyncRead + Unpin>(file: &mut F, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Content type by file extension.
pub fn content_type_for(name: &str) -> Option<&'static str> {
    let file = name.rsplit('/').next().unwrap_or(name);
    let (_, ext) = file.rsplit_once('.')?;
    let ct = match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(ct)
}

/// Guess a content type from the leading bytes.
pub fn sniff(data: &[u8]) -> &'static str {
    let trimmed = match data.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(i) => &data[i..],
        None => return "text/plain; charset=utf-8",
    };

    let starts_with_ci = |prefix: &[u8]| {
        trimmed.len() >= prefix.len() && trimmed[..prefix.len()].eq_ignore_ascii_case(prefix)
    };
    for tag in [
        &b"<!doctype html"[..],
        &b"<html"[..],
        &b"<head"[..],
        &b"<body"[..],
        &b"<script"[..],
    ] {
        if starts_with_ci(tag) {
            return "text/html; charset=utf-8";
        }
    }
    if starts_with_ci(b"<?xml") {
        return "text/xml; charset=utf-8";
    }
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if data.starts_with(b"%PDF-") {
        return "application/pdf";
    }

    let text = match std::str::from_utf8(data) {
        Ok(_) => true,
        // A multi-byte character cut off by the sniff window is fine.
        Err(e) => e.error_len().is_none(),
    };
    if text && !data.contains(&0) {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}
