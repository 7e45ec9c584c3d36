//! Request dispatch.
//!
//! # Responsibilities
//! - Detect client capabilities and select a build
//! - Resolve the file to serve (entrypoint for app routes)
//! - Open it and attach service worker scope and preload headers
//! - Hand the open file to content serving
//!
//! # Request State Machine
//! ```text
//! Start → CapabilitiesDetected → BuildSelected ──(no build)──→ 406
//!       → FileResolved ──(bad path)──→ 500
//!       → FileOpened ──(open error)──→ 500
//!       → HeadersSet → ContentSent → End
//! ```
//!
//! # Design Decisions
//! - No retries and no fallback to another build on failure
//! - Nothing is opened before a build is selected
//! - The open file is owned by this request and dropped exactly once,
//!   whichever way the request ends

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::builds::BuildCatalog;
use crate::capabilities::CapabilityDetector;
use crate::http::content::serve_content;
use crate::http::request;
use crate::http::response::DispatchError;
use crate::observability::metrics;
use crate::push;
use crate::routing::{self, is_service_worker};
use crate::storage::FileStore;

pub const SERVICE_WORKER_ALLOWED: HeaderName = HeaderName::from_static("service-worker-allowed");

/// Serves one site: a build catalog, a detector and a file store.
///
/// Immutable once constructed; share it behind an `Arc`.
pub struct Dispatcher<S> {
    catalog: BuildCatalog,
    detector: Arc<dyn CapabilityDetector>,
    store: S,
}

impl<S: FileStore> Dispatcher<S> {
    pub fn new(catalog: BuildCatalog, detector: impl CapabilityDetector, store: S) -> Self {
        Self::with_shared_detector(catalog, Arc::new(detector), store)
    }

    /// Like `new`, reusing a detector shared with other dispatchers.
    pub fn with_shared_detector(
        catalog: BuildCatalog,
        detector: Arc<dyn CapabilityDetector>,
        store: S,
    ) -> Self {
        Self {
            catalog,
            detector,
            store,
        }
    }

    pub fn catalog(&self) -> &BuildCatalog {
        &self.catalog
    }

    /// The detector, for handing on to a replacement dispatcher.
    pub fn detector(&self) -> Arc<dyn CapabilityDetector> {
        Arc::clone(&self.detector)
    }

    /// Answer one request. Every failure becomes a response.
    pub async fn handle(&self, parts: &Parts) -> Response {
        let start = Instant::now();
        let request_id = request::request_id(parts);

        let response = match self.dispatch(parts, request_id).await {
            Ok(response) => response,
            Err(DispatchError::Unsupported) => {
                tracing::debug!(
                    request_id = %request_id,
                    user_agent = %request::user_agent(parts),
                    "Client not supported by any build"
                );
                metrics::record_unsupported();
                DispatchError::Unsupported.into_response()
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    path = %parts.uri.path(),
                    error = %e,
                    "Request failed"
                );
                e.into_response()
            }
        };

        metrics::record_request(response.status().as_u16(), start);
        response
    }

    async fn dispatch(&self, parts: &Parts, request_id: &str) -> Result<Response, DispatchError> {
        let capabilities = self.detector.detect(request::user_agent(parts));
        let build = self
            .catalog
            .find_build(&capabilities)
            .ok_or(DispatchError::Unsupported)?;
        metrics::record_build(build.name());

        let resolved = routing::resolve(parts.uri.path(), build.entrypoint())?;

        let file = self
            .store
            .open(&resolved.served)
            .await
            .map_err(DispatchError::Open)?;

        let mut headers = HeaderMap::new();

        // Lets a worker served from a nested path claim the root scope.
        if is_service_worker(&resolved.request_path) {
            headers.insert(SERVICE_WORKER_ALLOWED, HeaderValue::from_static("/"));
        }

        let mut pushed = 0;
        if let Some(manifest) = build.push_manifest() {
            let scheme = request::effective_scheme(parts);
            let host = request::request_host(parts);
            pushed = push::add_headers(&mut headers, scheme, host, &resolved.served, manifest);
        }

        tracing::debug!(
            request_id = %request_id,
            build = %build.name(),
            path = %resolved.request_path,
            served = %resolved.served,
            entrypoint = resolved.is_entrypoint,
            pushed,
            "Serving file"
        );

        Ok(serve_content(
            &parts.method,
            &parts.headers,
            &resolved.request_path,
            SystemTime::now(),
            file,
            headers,
        )
        .await)
    }
}
