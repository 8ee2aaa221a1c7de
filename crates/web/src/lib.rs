//! HTML front end for the reading list. Holds no storage of its own; every
//! page is rendered from calls to the JSON API.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{routing::get, Router};
use readinglist_http::router::RouterBuilder;
use readinglist_kernel::settings::Settings;

pub mod client;
pub mod error;
pub mod handlers;

use client::ReadingListClient;

#[derive(Clone)]
pub struct WebState {
    pub client: Arc<ReadingListClient>,
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/book/view", get(handlers::book_view))
        .route(
            "/book/create",
            get(handlers::book_create_form)
                .post(handlers::book_create)
                .fallback(error::method_not_allowed),
        )
        .with_state(state)
}

/// Serve the web tier until a shutdown signal arrives
pub async fn start_server(settings: &Settings) -> anyhow::Result<()> {
    let client = ReadingListClient::new(
        settings.web.api_endpoint.clone(),
        Duration::from_millis(settings.web.client_timeout_ms),
    )
    .context("failed to build books API client")?;

    tracing::info!(api = %client.endpoint(), "web tier using books API");

    let app = RouterBuilder::new()
        .merge(router(WebState {
            client: Arc::new(client),
        }))
        .with_tracing()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .build();

    let addr = format!("{}:{}", settings.web.host, settings.web.port);
    readinglist_http::serve(&addr, app).await
}
