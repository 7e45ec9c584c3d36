//! Push manifest loading from disk.
//!
//! Reads the `push-manifest.json` layout emitted by Polymer-style build
//! tools:
//!
//! ```json
//! {
//!   "index.html": {
//!     "src/app.js": { "type": "script", "weight": 1 },
//!     "src/app.css": { "type": "style", "weight": 1 }
//!   }
//! }
//! ```
//!
//! Relative keys and asset paths are resolved against the directory the
//! manifest lives in, so a manifest under `es6/` in the site root maps
//! `index.html` to `/es6/index.html`.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::push::{PushAsset, PushManifest};
use crate::routing::resolve::{join, normalize, PathError};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read push manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse push manifest {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("push manifest {path}: {message}")]
    Format { path: String, message: String },

    #[error("push manifest {path}: {source}")]
    Path {
        path: String,
        #[source]
        source: PathError,
    },
}

/// Load the manifest at `relative` (relative to `root`).
pub fn load_push_manifest(root: &Path, relative: &str) -> Result<PushManifest, ManifestError> {
    let file = root.join(relative.trim_start_matches('/'));
    let content = fs::read_to_string(&file).map_err(|source| ManifestError::Io {
        path: relative.to_string(),
        source,
    })?;

    let base = manifest_base(relative).map_err(|source| ManifestError::Path {
        path: relative.to_string(),
        source,
    })?;
    let manifest = parse_push_manifest(&content, &base).map_err(|e| match e {
        ParseFailure::Json(source) => ManifestError::Parse {
            path: relative.to_string(),
            source,
        },
        ParseFailure::Format(message) => ManifestError::Format {
            path: relative.to_string(),
            message,
        },
        ParseFailure::Path(source) => ManifestError::Path {
            path: relative.to_string(),
            source,
        },
    })?;

    tracing::debug!(manifest = %relative, entries = manifest.len(), "Push manifest loaded");
    Ok(manifest)
}

/// Absolute URL directory containing the manifest file.
fn manifest_base(relative: &str) -> Result<String, PathError> {
    let absolute = format!("/{}", relative.trim_start_matches('/'));
    let dir = match absolute.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &absolute[..i],
    };
    normalize(dir)
}

#[derive(Debug)]
pub(crate) enum ParseFailure {
    Json(serde_json::Error),
    Format(String),
    Path(PathError),
}

/// Parse manifest JSON, resolving relative paths against `base`.
pub(crate) fn parse_push_manifest(content: &str, base: &str) -> Result<PushManifest, ParseFailure> {
    let root: Map<String, Value> = serde_json::from_str(content).map_err(ParseFailure::Json)?;

    let mut manifest = PushManifest::new();
    for (served, assets) in root {
        let Value::Object(assets) = assets else {
            return Err(ParseFailure::Format(format!(
                "entry {:?} must be an object of assets",
                served
            )));
        };

        let mut list = Vec::with_capacity(assets.len());
        for (asset_path, info) in assets {
            let kind = match &info {
                Value::Object(fields) => match fields.get("type") {
                    Some(Value::String(t)) => t.clone(),
                    None => String::new(),
                    Some(other) => {
                        return Err(ParseFailure::Format(format!(
                            "asset {:?} has non-string type {}",
                            asset_path, other
                        )))
                    }
                },
                _ => {
                    return Err(ParseFailure::Format(format!(
                        "asset {:?} must be an object",
                        asset_path
                    )))
                }
            };
            list.push(PushAsset::new(resolve_asset(base, &asset_path)?, kind));
        }

        let key = join(base, &served).map_err(ParseFailure::Path)?;
        manifest = manifest.with_entry(key, list);
    }
    Ok(manifest)
}

fn resolve_asset(base: &str, path: &str) -> Result<String, ParseFailure> {
    if path.contains("://") {
        return Ok(path.to_string());
    }
    join(base, path).map_err(ParseFailure::Path)
}
