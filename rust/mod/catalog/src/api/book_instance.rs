use axum::{
    extract::{Path, RawForm, State},
    response::Response,
    routing::get,
    Router,
};

use locallib_core::ServiceError;

use super::AppState;
use crate::form::FormData;
use crate::service::book_instance::BookInstanceForm;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookinstances", get(list))
        .route("/bookinstance/create", get(create_get).post(create_post))
        .route("/bookinstance/{id}", get(detail))
        .route("/bookinstance/{id}/delete", get(delete_get).post(delete_post))
        .route("/bookinstance/{id}/update", get(update_get).post(update_post))
}

fn parse(body: &[u8]) -> BookInstanceForm {
    BookInstanceForm::from_form(&FormData::parse(body))
}

async fn list(State(state): State<AppState>) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_list().await)
}

async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_detail(&id).await)
}

async fn create_get(State(state): State<AppState>) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_create_get().await)
}

async fn create_post(State(state): State<AppState>, RawForm(body): RawForm) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_create_post(parse(&body)).await)
}

async fn delete_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_delete_get(&id).await)
}

async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_delete_post(&id).await)
}

async fn update_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_update_get(&id).await)
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, ServiceError> {
    state.respond(state.svc.bookinstance_update_post(&id, parse(&body)).await)
}
