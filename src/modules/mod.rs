pub mod books;

use std::sync::Arc;

use readinglist_kernel::{settings::Settings, ModuleRegistry};

use books::store::BookStore;

/// Register all API modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    settings: &Settings,
    store: Arc<dyn BookStore>,
) -> anyhow::Result<()> {
    registry.register(books::create_module(store, settings.books.empty_genres))
}
