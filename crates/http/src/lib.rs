//! HTTP facade for the reading list services: strict body decoding, response
//! envelopes, error mapping and the shared middleware stack.

use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::{Timestamp, Uuid};

use readinglist_kernel::{settings::Settings, ModuleRegistry};

pub mod decode;
pub mod envelope;
pub mod error;
pub mod router;

use error::AppError;
use router::RouterBuilder;

/// Version reported by the healthcheck.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Start the API server and serve until a shutdown signal arrives
pub async fn start_server(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let app = build_router(registry, settings);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    tracing::info!(
        environment = %settings.environment,
        "starting {} server on {}",
        settings.environment,
        addr
    );

    serve(&addr, app).await
}

/// Bind `addr` and serve `app` with graceful shutdown on Ctrl-C / SIGTERM
pub async fn serve(addr: &str, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the API router with every module mounted under `/v1`
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new().route(
        "/healthcheck",
        get(healthcheck)
            .fallback(error::method_not_allowed)
            .with_state(HealthState {
                environment: settings.environment.as_str(),
            }),
    );

    for module in registry.modules() {
        tracing::info!(
            module = module.name(),
            "mounting module routes under /v1/{}",
            module.name()
        );
        router_builder = router_builder.mount_module(module.name(), module.routes());
    }

    router_builder
        .with_not_found_fallback()
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .build()
}

#[derive(Clone)]
struct HealthState {
    environment: &'static str,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    environment: &'static str,
    version: &'static str,
}

async fn healthcheck(State(state): State<HealthState>) -> Result<Response, AppError> {
    let health = Health {
        status: "available",
        environment: state.environment,
        version: VERSION,
    };
    envelope::write_json(StatusCode::OK, &health, HeaderMap::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

/// Request ID generator producing time-ordered UUIDs
#[derive(Clone, Copy)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}
