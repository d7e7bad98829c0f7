use axum::{
    extract::{Path, RawForm, State},
    response::Response,
    routing::get,
    Router,
};

use locallib_core::ServiceError;

use super::AppState;
use crate::form::FormData;
use crate::service::genre::GenreForm;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/genres", get(list))
        .route("/genre/create", get(create_get).post(create_post))
        .route("/genre/{id}", get(detail))
        .route("/genre/{id}/delete", get(delete_get).post(delete_post))
        .route("/genre/{id}/update", get(update_get).post(update_post))
}

async fn list(State(state): State<AppState>) -> Result<Response, ServiceError> {
    state.respond(state.svc.genre_list().await)
}

async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.genre_detail(&id).await)
}

async fn create_get(State(state): State<AppState>) -> Result<Response, ServiceError> {
    state.respond(state.svc.genre_create_get().await)
}

async fn create_post(State(state): State<AppState>, RawForm(body): RawForm) -> Result<Response, ServiceError> {
    let form = GenreForm::from_form(&FormData::parse(&body));
    state.respond(state.svc.genre_create_post(form).await)
}

async fn delete_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.genre_delete_get(&id).await)
}

async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.genre_delete_post(&id).await)
}

async fn update_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.genre_update_get(&id).await)
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, ServiceError> {
    let form = GenreForm::from_form(&FormData::parse(&body));
    state.respond(state.svc.genre_update_post(&id, form).await)
}
