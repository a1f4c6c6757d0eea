//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID, CORS)
//! - Own the gatekeeper and render pipeline shared by handlers
//! - Run the rate-limit sweeper alongside the server
//! - Serve until the shutdown broadcast fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{fill_missing_secrets, secret_fingerprint, CorsConfig, GatewayConfig};
use crate::http::handlers;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::render::RenderPipeline;
use crate::security::plan::PLAN_HEADER;
use crate::security::rate_limit::spawn_sweeper;
use crate::security::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::security::Gatekeeper;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gatekeeper: Arc<Gatekeeper>,
    pub pipeline: Arc<RenderPipeline>,
}

/// HTTP front end of the QR gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Build the server. Secrets missing from `config` are generated here.
    pub fn new(mut config: GatewayConfig) -> Self {
        for name in fill_missing_secrets(&mut config) {
            let value = match name {
                "auth.api_token" => config.auth.api_token.as_deref(),
                _ => config.signing.secret.as_deref(),
            };
            tracing::warn!(
                secret = name,
                fingerprint = %secret_fingerprint(value.unwrap_or_default()),
                "No secret configured, generated one for this process"
            );
        }

        let state = AppState {
            gatekeeper: Arc::new(Gatekeeper::from_config(&config)),
            pipeline: Arc::new(RenderPipeline::new(&config.render)),
        };
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/v1/qr/{variant}", post(handlers::render))
            .route("/generate", post(handlers::generate))
            .route("/api/v1/styles", get(handlers::styles))
            .route("/files/{filename}", get(handlers::files))
            .with_state(state)
            .layer(cors_layer(&config.cors))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            output_dir = %self.config.render.output_dir,
            "HTTP server starting"
        );

        let sweeper = spawn_sweeper(
            Arc::clone(self.state.gatekeeper.rate_limiter()),
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs.max(1)),
            shutdown.resubscribe(),
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        let _ = sweeper.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// CORS for the configured origins; `*` allows any. No origins, no CORS.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(SIGNATURE_HEADER),
            HeaderName::from_static(TIMESTAMP_HEADER),
            HeaderName::from_static(PLAN_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            header::RETRY_AFTER,
        ]);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}
