pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use readinglist_kernel::{settings::EmptyGenresPolicy, InitCtx, Module};

use routes::BooksState;
use store::BookStore;

/// The books resource: CRUD over a [`BookStore`], mounted at `/v1/books`.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>, empty_genres: EmptyGenresPolicy) -> Self {
        Self {
            state: BooksState {
                store,
                empty_genres,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = %ctx.settings.environment,
            empty_genres = ?self.state.empty_genres,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        // Fails fast when the backing store is unreachable.
        let count = self.state.store.get_all().await?.len();
        tracing::info!(module = self.name(), books = count, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over `store`
pub fn create_module(store: Arc<dyn BookStore>, empty_genres: EmptyGenresPolicy) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, empty_genres))
}
