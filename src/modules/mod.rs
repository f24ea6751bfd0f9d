pub mod authors;
pub mod books;

use std::sync::Arc;

use literalura_catalog::{BookSearch, CatalogService};
use literalura_kernel::ModuleRegistry;

/// Register the catalog modules; both share one service and its read cache.
pub fn register_all<S: BookSearch + 'static>(
    registry: &mut ModuleRegistry,
    service: Arc<CatalogService<S>>,
) {
    registry.register(Arc::new(authors::AuthorsModule::new(service.clone())));
    registry.register(Arc::new(books::BooksModule::new(service)));
}
