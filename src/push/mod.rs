//! Resource push hints.
//!
//! # Data Flow
//! ```text
//! push-manifest.json (per build, loaded at startup)
//!     → manifest.rs (parse, resolve paths to absolute)
//!     → PushManifest (immutable)
//!
//! Per request:
//!     served file path + scheme + host
//!     → add_headers
//!     → one `Link: <scheme://host/path>; rel=preload; as=type` per asset
//! ```
//!
//! # Design Decisions
//! - Keyed by the file actually served, after entrypoint resolution
//! - Asset order is preserved from the manifest
//! - Assets listed twice are emitted twice (no de-duplication)

pub mod manifest;

use std::collections::HashMap;

use axum::http::header::{HeaderMap, HeaderValue, LINK};

pub use manifest::{load_push_manifest, ManifestError};

/// A dependent resource to preload alongside a served file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushAsset {
    /// Absolute path (or full URL) of the resource.
    pub path: String,
    /// Preload destination (`script`, `style`, `font`, ...). May be empty.
    pub kind: String,
}

impl PushAsset {
    pub fn new(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// Render the `Link` header value for this asset.
    pub fn link_value(&self, scheme: &str, host: &str) -> String {
        let target = if self.path.contains("://") {
            self.path.clone()
        } else if self.path.starts_with('/') {
            format!("{}://{}{}", scheme, host, self.path)
        } else {
            format!("{}://{}/{}", scheme, host, self.path)
        };

        if self.kind.is_empty() {
            format!("<{}>; rel=preload", target)
        } else {
            format!("<{}>; rel=preload; as={}", target, self.kind)
        }
    }
}

/// Mapping from a served file to the assets to push with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushManifest {
    entries: HashMap<String, Vec<PushAsset>>,
}

impl PushManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous one for the same path.
    pub fn with_entry(mut self, path: impl Into<String>, assets: Vec<PushAsset>) -> Self {
        self.entries.insert(path.into(), assets);
        self
    }

    pub fn get(&self, path: &str) -> Option<&[PushAsset]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Append preload `Link` headers for `path` if the manifest has an entry.
///
/// Returns the number of headers added. A missing entry adds nothing.
pub fn add_headers(
    headers: &mut HeaderMap,
    scheme: &str,
    host: &str,
    path: &str,
    manifest: &PushManifest,
) -> usize {
    let Some(assets) = manifest.get(path) else {
        return 0;
    };

    let mut added = 0;
    for asset in assets {
        let value = asset.link_value(scheme, host);
        match HeaderValue::from_str(&value) {
            Ok(v) => {
                headers.append(LINK, v);
                added += 1;
            }
            Err(_) => {
                tracing::warn!(asset = %asset.path, host = %host, "Skipping push asset with invalid header value");
            }
        }
    }
    added
}
