//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, SeekFrom};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use prpl_server::builds::{AllOf, Build, BuildCatalog, HasCapability};
use prpl_server::capabilities::CapabilitySet;
use prpl_server::config::TimeoutConfig;
use prpl_server::http::{build_router, AppState, Dispatcher};
use prpl_server::push::{PushAsset, PushManifest};
use prpl_server::storage::FileStore;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};
use tower::ServiceExt;

pub const MODERN_HTML: &str = "<!doctype html><title>modern</title>";
pub const ES6_HTML: &str = "<!doctype html><title>es6</title>";
pub const SEEK_FAILURE: &str = "seek failed: device unavailable";
pub const ES5_HTML: &str = "<!doctype html><title>es5</title>";

/// Open and release counts for a `MemoryStore`.
#[derive(Debug, Default)]
pub struct Counters {
    opens: AtomicUsize,
    releases: AtomicUsize,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// In-memory file store that counts every handle it hands out and every
/// handle dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: Arc<HashMap<String, Vec<u8>>>,
    unseekable: Arc<HashSet<String>>,
    counters: Arc<Counters>,
}

impl MemoryStore {
    pub fn new<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        Self {
            files: Arc::new(
                files
                    .into_iter()
                    .map(|(p, c)| (p.into(), c.into()))
                    .collect(),
            ),
            unseekable: Arc::new(HashSet::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Make `path` open normally but fail on its first seek.
    pub fn with_unseekable(mut self, path: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.unseekable).insert(path.into());
        self
    }

    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}

impl FileStore for MemoryStore {
    type File = TrackedFile;

    async fn open(&self, path: &str) -> io::Result<TrackedFile> {
        let data = self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("open {}: file does not exist", path))
        })?;
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(TrackedFile {
            inner: Cursor::new(data),
            fail_seek: self.unseekable.contains(path),
            counters: Arc::clone(&self.counters),
        })
    }
}

/// File handle that records its own release.
pub struct TrackedFile {
    inner: Cursor<Vec<u8>>,
    fail_seek: bool,
    counters: Arc<Counters>,
}

impl Drop for TrackedFile {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl AsyncRead for TrackedFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncSeek for TrackedFile {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        if self.fail_seek {
            return Err(io::Error::new(io::ErrorKind::Other, SEEK_FAILURE));
        }
        Pin::new(&mut self.inner).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.inner).poll_complete(cx)
    }
}

/// Test detector: the user agent is a comma-separated list of flags.
pub fn flags_from_user_agent(user_agent: &str) -> CapabilitySet {
    CapabilitySet::new().with_flags(
        user_agent
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    )
}

/// Three builds, most capable first, with a push manifest on `es6`.
pub fn three_build_catalog() -> BuildCatalog {
    let es6_push = PushManifest::new().with_entry(
        "/es6/index.html",
        vec![
            PushAsset::new("/es6/app.js", "script"),
            PushAsset::new("/es6/style.css", "style"),
        ],
    );
    BuildCatalog::new(vec![
        Build::new("modern", "/modern/index.html", AllOf::capabilities(["es2015", "modules"])).unwrap(),
        Build::new("es6", "/es6/index.html", HasCapability::new("es2015"))
            .unwrap()
            .with_push_manifest(es6_push),
        Build::fallback("es5", "/es5/index.html").unwrap(),
    ])
}

pub fn site_store() -> MemoryStore {
    MemoryStore::new([
        ("/modern/index.html", MODERN_HTML.as_bytes().to_vec()),
        ("/es6/index.html", ES6_HTML.as_bytes().to_vec()),
        ("/es6/app.js", b"console.log('es6');".to_vec()),
        ("/es6/style.css", b"body { margin: 0 }".to_vec()),
        ("/es5/index.html", ES5_HTML.as_bytes().to_vec()),
        ("/sw/service-worker.js", b"self.addEventListener('fetch', () => {});".to_vec()),
        ("/data/digits.txt", b"0123456789".to_vec()),
    ])
}

pub fn router(catalog: BuildCatalog, store: MemoryStore) -> Router {
    let dispatcher = Dispatcher::new(catalog, flags_from_user_agent, store);
    build_router(AppState::new(dispatcher), &TimeoutConfig::default())
}

pub fn get(uri: &str, user_agent: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("host", "example.com")
        .header("user-agent", user_agent)
        .body(Body::empty())
        .unwrap()
}

/// Send a request and collect the whole body.
pub async fn send(router: &Router, request: Request<Body>) -> (Response<Body>, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (
        Response::from_parts(parts, Body::empty()),
        String::from_utf8_lossy(&bytes).into_owned(),
    )
}

pub fn links(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("link")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
