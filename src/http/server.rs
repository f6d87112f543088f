//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the pipeline fallthrough handler
//! - Wire up middleware (timeout, request ID, tracing, limits)
//! - Serve plain TCP or TLS depending on configuration
//! - Apply hot-reloaded configuration to the pipeline engine
//! - Observability (metrics, request IDs)
//!
//! # Design Decisions
//! - Every path goes to the one pipeline handler; routing *is* the
//!   filesystem walk, so there is no route table here
//! - Config reload swaps the engine atomically; middleware settings
//!   (bind address, limits) take effect on restart only

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request as HttpRequest,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{into_pipeline_request, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::into_http_response;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::pipeline::Engine;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ArcSwap<Engine>>,
    pub max_body_size: usize,
}

/// HTTP server front end for the pipeline engine.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    engine: Arc<ArcSwap<Engine>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let engine = Arc::new(ArcSwap::from_pointee(Engine::new(&config)));

        let state = AppState {
            engine: engine.clone(),
            max_body_size: config.pipeline.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            engine,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(pipeline_handler))
            .route("/", any(pipeline_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
            .layer(RequestBodyLimitLayer::new(config.pipeline.max_body_size))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `config_updates` delivers hot-reloaded configurations; `shutdown`
    /// ends the accept loop gracefully.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.config.listener.tls.is_some(),
            "HTTP server starting"
        );

        // Apply reloaded configs to the engine for as long as we run.
        let engine = self.engine.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!("Applying reloaded configuration to the pipeline engine");
                engine.store(Arc::new(Engine::new(&new_config)));
            }
        });

        if let Some(tls) = self.config.listener.tls.clone() {
            let tls_config = load_tls_config(&tls).await?;

            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown.wait().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            axum_server::from_tcp_rustls(listener.into_std()?, tls_config)
                .handle(handle)
                .serve(self.router.into_make_service())
                .await?;
        } else {
            axum::serve(listener, self.router.into_make_service())
                .with_graceful_shutdown(shutdown.wait())
                .await?;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// The one handler: every request flows into the pipeline engine.
async fn pipeline_handler(
    State(state): State<AppState>,
    request: HttpRequest<Body>,
) -> Response {
    let start = Instant::now();
    let verb = request.method().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %verb,
        path = %request.uri().path(),
        "Dispatching request into pipeline"
    );

    let engine = state.engine.load_full();
    let pipeline_request = match into_pipeline_request(request, state.max_body_size).await {
        Ok(v) => v,
        Err(status) => {
            metrics::record_request(&verb, status.as_u16(), start);
            return status.into_response();
        }
    };

    let response = engine.handle(pipeline_request).await;
    metrics::record_request(&verb, response.status, start);
    into_http_response(response)
}
