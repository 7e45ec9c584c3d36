//! Path classification rules.
//!
//! # Responsibilities
//! - Recognize paths that name a file (carry an extension)
//! - Recognize service worker scripts
//!
//! # Design Decisions
//! - Patterns are compiled once and shared by all requests
//! - Patterns are a boundary contract: `\.[^/]*$` and
//!   `service-worker\.js$`, matched against the decoded request path
//! - Matching is case-sensitive

use std::sync::LazyLock;

use regex::Regex;

// Matches "/foo/bar.png" but not "/foo.png/bar".
static HAS_FILE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^/]*$").expect("extension pattern compiles"));

static IS_SERVICE_WORKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"service-worker\.js$").expect("service worker pattern compiles"));

/// True when the last path segment contains a dot.
pub fn has_file_extension(path: &str) -> bool {
    HAS_FILE_EXTENSION.is_match(path)
}

/// True for requests that should be treated as application routes and
/// answered with the build's entrypoint.
pub fn is_app_route(path: &str) -> bool {
    path == "/" || !has_file_extension(path)
}

/// True when the path names a service worker script.
pub fn is_service_worker(path: &str) -> bool {
    IS_SERVICE_WORKER.is_match(path)
}
