//! HTTP API for Minnow.
//!
//! Provides an [`ApiServer`] exposing the object gateway over axum:
//!
//! - `GET /health`: liveness probe
//! - `PUT /api/v1/object/{id}`: store an object (requires `Content-Length`)
//! - `GET /api/v1/object/{id}`: retrieve an object
//!
//! Every response carries an `X-Request-ID` header, taken from the request
//! when the client sent one. Errors are JSON bodies of the form
//! `{"status":"error","message":"..."}`.

mod error;
mod handlers;
mod middleware;


use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use minnow_gateway::ObjectGateway;
use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;
pub use handlers::ApiResponse;
pub use middleware::{REQUEST_ID_HEADER, RequestId};

/// Shared state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    /// The gateway requests are served from.
    pub gateway: Arc<dyn ObjectGateway>,
}

/// HTTP server backed by an [`ObjectGateway`].
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Create a server serving `gateway`.
    pub fn new(gateway: Arc<dyn ObjectGateway>) -> Self {
        let router = Self::build_router(AppState { gateway });
        Self { router }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/api/v1/object/{id}",
                get(handlers::get_object).put(handlers::put_object),
            )
            // Last layer is outermost: request context wraps panic recovery.
            .layer(axum::middleware::from_fn(middleware::catch_panic))
            .layer(axum::middleware::from_fn(middleware::request_context))
            .with_state(state)
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve the API on `listener` with graceful shutdown triggered by the
    /// given future.
    ///
    /// When `shutdown` completes, the server stops accepting new connections
    /// and waits for in-flight requests to finish.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        info!(%addr, "HTTP API listening");
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
