//! Server-sent events endpoint for live reload.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::Stream;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};

use crate::reload::ReloadHub;

/// Port the reload endpoint listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 5678;

/// Configuration for the reload server.
#[derive(Debug, Clone)]
pub struct ReloadServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ReloadServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ReloadServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("Server error: {0}")]
    Serve(String),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),
}

/// Bind the reload endpoint's listener.
pub async fn bind(config: &ReloadServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::BindError(addr, e.to_string()))
}

/// Router exposing the event stream at `/`.
pub fn router(hub: ReloadHub) -> Router {
    Router::new()
        .route("/", get(events_handler))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(hub)
}

/// Serve the reload endpoint until the process ends.
pub async fn serve(listener: TcpListener, hub: ReloadHub) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Live reload listening at http://{}", addr);
    }

    axum::serve(listener, router(hub))
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))
}

async fn events_handler(
    State(hub): State<ReloadHub>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = hub.subscribe();
    tracing::debug!("Reload client connected");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield Ok(Event::default().event(event.name()).data("")),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Reload client skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
