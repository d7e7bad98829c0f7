pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

use std::sync::Arc;

use axum::{extract::State, response::Response, routing::get, Router};

use locallib_core::ServiceError;

use crate::service::{CatalogService, Page};
use crate::view::{JsonRenderer, ViewRenderer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub svc: Arc<CatalogService>,
    pub views: Arc<dyn ViewRenderer>,
}

impl AppState {
    /// State that renders pages as JSON.
    pub fn new(svc: Arc<CatalogService>) -> Self {
        Self {
            svc,
            views: Arc::new(JsonRenderer),
        }
    }

    fn respond(&self, page: Result<Page, ServiceError>) -> Result<Response, ServiceError> {
        page?.into_response_with(self.views.as_ref())
    }
}

/// Build the catalog router, mounted at `/catalog`. The home page answers
/// with and without the trailing slash.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/catalog/", get(index))
        .nest("/catalog", catalog_routes())
        .with_state(state)
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .merge(book::routes())
        .merge(author::routes())
        .merge(genre::routes())
        .merge(book_instance::routes())
}

async fn index(State(state): State<AppState>) -> Result<Response, ServiceError> {
    state.respond(state.svc.index().await)
}
