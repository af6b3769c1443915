//! HTTP surface: snapshot API, health probe and static dashboard files.

use crate::config::{Config, CredentialSource, EnvCredentials};
use crate::data::GatewayDescriptor;
use crate::integrations::openclaw::ToolInvoker;
use crate::status::fleet::poll_fleet;
use crate::status::PollContext;
use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};

/// Dashboard page served for `/` and `/lobster-room`.
pub const INDEX_FILE: &str = "lobster-room.html";

pub struct AppState<I> {
    pub config: Arc<Config>,
    pub gateways: Arc<Vec<GatewayDescriptor>>,
    pub invoker: Arc<I>,
    pub credentials: Arc<dyn CredentialSource + Send>,
}

impl<I> Clone for AppState<I> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            gateways: Arc::clone(&self.gateways),
            invoker: Arc::clone(&self.invoker),
            credentials: Arc::clone(&self.credentials),
        }
    }
}

impl<I> AppState<I> {
    /// State reading bearer tokens from the process environment.
    pub fn new(config: Config, invoker: I) -> Self {
        Self::with_credentials(config, invoker, Arc::new(EnvCredentials))
    }

    pub fn with_credentials(
        config: Config,
        invoker: I,
        credentials: Arc<dyn CredentialSource + Send>,
    ) -> Self {
        let gateways = config.gateways();
        Self {
            config: Arc::new(config),
            gateways: Arc::new(gateways),
            invoker: Arc::new(invoker),
            credentials,
        }
    }
}

/// Build the router.
pub fn build_app<I>(state: AppState<I>) -> Router<()>
where
    I: ToolInvoker + Send + 'static,
{
    let web_root = state.config.server.web_root.clone();
    let index = web_root.join(INDEX_FILE);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/healthz/", get(healthz))
        .route("/api/lobster-room", get(lobster_room::<I>))
        .route_service("/", ServeFile::new(&index))
        .route_service("/lobster-room", ServeFile::new(&index))
        .route_service("/lobster-room/", ServeFile::new(&index))
        .fallback_service(ServeDir::new(&web_root))
        .layer(middleware::from_fn(no_store_dashboard))
        .with_state(state)
}

/// Dashboard pages and scripts must never be served from the browser cache.
fn is_dashboard_asset(path: &str) -> bool {
    path == "/"
        || path == "/lobster-room"
        || path == "/lobster-room/"
        || path.ends_with(".html")
        || path.ends_with(".js")
}

async fn no_store_dashboard(request: Request, next: Next) -> Response {
    let no_store = is_dashboard_asset(request.uri().path());
    let mut response = next.run(request).await;
    if no_store {
        response.headers_mut().insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
    }
    response
}

async fn healthz() -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, "no-cache"),
        ],
        "ok",
    )
}

/// Fresh snapshot on every request; nothing is cached between polls.
async fn lobster_room<I>(State(state): State<AppState<I>>) -> impl IntoResponse
where
    I: ToolInvoker + Send + 'static,
{
    let ctx = PollContext::from_config(&state.config);
    let snapshot = poll_fleet(
        &ctx,
        &state.gateways,
        state.invoker.as_ref(),
        state.credentials.as_ref(),
    )
    .await;

    ([(CACHE_CONTROL, "no-cache")], Json(snapshot))
}

/// Bind and serve until Ctrl-C.
pub async fn serve<I>(state: AppState<I>) -> Result<()>
where
    I: ToolInvoker + Send + 'static,
{
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let gateway_count = state.gateways.len();
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Serving on http://{addr}/ ({gateway_count} gateways)");
    if gateway_count == 0 {
        tracing::warn!("No gateways configured. Set LOBSTER_ROOM_GATEWAYS_JSON");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {e}");
            }
        })
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
