//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Swap in a freshly compiled dispatcher on config reload
//! - Drain in-flight requests on shutdown

use std::io;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ServerConfig, TimeoutConfig};
use crate::http::dispatch::Dispatcher;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::startup::build_dispatcher_with;
use crate::storage::{DirectoryStore, FileStore};

/// Application state injected into handlers.
///
/// Requests load the current dispatcher once and keep using it even if a
/// reload replaces it mid-flight.
pub struct AppState<S> {
    dispatcher: Arc<ArcSwap<Dispatcher<S>>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<S: FileStore> AppState<S> {
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        Self {
            dispatcher: Arc::new(ArcSwap::from_pointee(dispatcher)),
        }
    }

    pub fn current(&self) -> Arc<Dispatcher<S>> {
        self.dispatcher.load_full()
    }

    pub fn replace(&self, dispatcher: Dispatcher<S>) {
        self.dispatcher.store(Arc::new(dispatcher));
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router<S: FileStore>(state: AppState<S>, timeouts: &TimeoutConfig) -> Router {
    Router::new()
        .route("/", get(dispatch_handler::<S>))
        .route("/{*path}", get(dispatch_handler::<S>))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn dispatch_handler<S: FileStore>(
    State(state): State<AppState<S>>,
    request: Request<Body>,
) -> Response {
    let (parts, _body) = request.into_parts();
    let dispatcher = state.current();
    dispatcher.handle(&parts).await
}

/// HTTP server for a PRPL site on disk.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    state: AppState<DirectoryStore>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, dispatcher: Dispatcher<DirectoryStore>) -> Self {
        let state = AppState::new(dispatcher);
        let router = build_router(state.clone(), &config.timeouts);
        Self {
            router,
            config,
            state,
        }
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Each config received on `config_updates` is compiled into a new
    /// dispatcher; a config that fails to compile is logged and ignored.
    /// Listener and timeout settings only take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            builds = self.state.current().catalog().len(),
            root = ?self.config.site.root,
            "HTTP server starting"
        );

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                reload(&state, config).await;
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Compile `config` into a dispatcher and swap it in, keeping the
/// current detector. Returns whether the swap happened.
pub async fn reload(state: &AppState<DirectoryStore>, config: ServerConfig) -> bool {
    let detector = state.current().detector();
    let compiled =
        tokio::task::spawn_blocking(move || build_dispatcher_with(&config, detector)).await;
    match compiled {
        Ok(Ok(dispatcher)) => {
            let builds = dispatcher.catalog().len();
            state.replace(dispatcher);
            tracing::info!(builds, "Dispatcher reloaded");
            true
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Reload rejected; keeping current dispatcher");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Reload task failed");
            false
        }
    }
}
