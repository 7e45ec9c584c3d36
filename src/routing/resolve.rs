//! Served-file resolution.
//!
//! # Responsibilities
//! - Decode and normalize the request path to an absolute form
//! - Choose between the build entrypoint and the literal path
//!
//! # Design Decisions
//! - Normalization is lexical: `.` and empty segments dropped, `..`
//!   pops a segment but never climbs above `/`
//! - Classification runs on the decoded path, before normalization
//! - Normalization errors fail the request even when the entrypoint
//!   would have been served

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::routing::matcher::is_app_route;

/// Why a request path could not be turned into a file path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is not absolute: {0:?}")]
    NotAbsolute(String),

    #[error("path is not valid UTF-8 after percent-decoding")]
    InvalidEncoding,

    #[error("path contains a NUL byte")]
    NulByte,
}

/// Outcome of resolving one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Percent-decoded request path, as used for pattern matching.
    pub request_path: String,
    /// Absolute path of the file to open.
    pub served: String,
    /// Whether `served` is the build's entrypoint.
    pub is_entrypoint: bool,
}

/// Percent-decode a raw URI path.
pub fn decode_path(raw: &str) -> Result<String, PathError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| PathError::InvalidEncoding)?;
    Ok(decoded.into_owned())
}

/// Lexically clean an absolute path.
pub fn normalize(path: &str) -> Result<String, PathError> {
    if !path.starts_with('/') {
        return Err(PathError::NotAbsolute(path.to_string()));
    }
    if path.contains('\0') {
        return Err(PathError::NulByte);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Join a possibly relative path onto an absolute base directory.
pub fn join(base: &str, path: &str) -> Result<String, PathError> {
    if path.starts_with('/') {
        normalize(path)
    } else {
        normalize(&format!("{}/{}", base.trim_end_matches('/'), path))
    }
}

/// Decide which file answers a request for `raw_path`.
pub fn resolve(raw_path: &str, entrypoint: &str) -> Result<ResolvedPath, PathError> {
    let request_path = decode_path(raw_path)?;
    let normalized = normalize(&request_path)?;

    let is_entrypoint = is_app_route(&request_path);
    let served = if is_entrypoint {
        entrypoint.to_string()
    } else {
        normalized
    };

    Ok(ResolvedPath {
        request_path,
        served,
        is_entrypoint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/").unwrap(), "/");
        assert_eq!(normalize("/a//b/./c/").unwrap(), "/a/b/c");
        assert_eq!(normalize("/a/../b").unwrap(), "/b");
        assert_eq!(normalize("/../../etc/passwd").unwrap(), "/etc/passwd");
        assert!(matches!(normalize("relative"), Err(PathError::NotAbsolute(_))));
        assert_eq!(normalize("/a\0b"), Err(PathError::NulByte));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/es6", "src/app.js").unwrap(), "/es6/src/app.js");
        assert_eq!(join("/es6/", "./index.html").unwrap(), "/es6/index.html");
        assert_eq!(join("/es6", "/shared.css").unwrap(), "/shared.css");
        assert_eq!(join("/", "a.js").unwrap(), "/a.js");
    }

    #[test]
    fn test_resolve_routes_to_entrypoint() {
        for path in ["/", "/app/settings", "/users/7/"] {
            let r = resolve(path, "/modern/index.html").unwrap();
            assert_eq!(r.served, "/modern/index.html", "path {}", path);
            assert!(r.is_entrypoint);
        }
    }

    #[test]
    fn test_resolve_files_literally() {
        let r = resolve("/static/app.js", "/index.html").unwrap();
        assert_eq!(r.served, "/static/app.js");
        assert!(!r.is_entrypoint);

        let r = resolve("/static/../img/logo%20big.png", "/index.html").unwrap();
        assert_eq!(r.request_path, "/static/../img/logo big.png");
        assert_eq!(r.served, "/img/logo big.png");
    }

    #[test]
    fn test_resolve_errors() {
        assert_eq!(resolve("/bad%ff.js", "/index.html"), Err(PathError::InvalidEncoding));
        assert_eq!(resolve("/nul%00", "/index.html"), Err(PathError::NulByte));
        assert!(matches!(resolve("*", "/index.html"), Err(PathError::NotAbsolute(_))));
    }
}
