//! Local library catalog: books, authors, genres and book copies.

pub mod api;
pub mod format;
pub mod form;
pub mod model;
pub mod service;
pub mod view;

use std::sync::Arc;

use axum::Router;
use locallib_core::Module;
use locallib_kv::KVStore;

use api::AppState;
use service::CatalogService;

/// Catalog module, mounted under `/catalog`.
pub struct CatalogModule {
    service: Arc<CatalogService>,
}

impl CatalogModule {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            service: Arc::new(CatalogService::new(kv)),
        }
    }
}

impl Module for CatalogModule {
    fn name(&self) -> &str {
        "catalog"
    }

    fn routes(&self) -> Router {
        api::router(AppState::new(self.service.clone()))
    }
}
