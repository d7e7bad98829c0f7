use axum::{
    extract::{Path, RawForm, State},
    response::Response,
    routing::get,
    Router,
};

use locallib_core::ServiceError;

use super::AppState;
use crate::form::FormData;
use crate::service::book::BookForm;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list))
        .route("/book/create", get(create_get).post(create_post))
        .route("/book/{id}", get(detail))
        .route("/book/{id}/delete", get(delete_get).post(delete_post))
        .route("/book/{id}/update", get(update_get).post(update_post))
}

async fn list(State(state): State<AppState>) -> Result<Response, ServiceError> {
    state.respond(state.svc.book_list().await)
}

async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.book_detail(&id).await)
}

async fn create_get(State(state): State<AppState>) -> Result<Response, ServiceError> {
    state.respond(state.svc.book_create_get().await)
}

async fn create_post(State(state): State<AppState>, RawForm(body): RawForm) -> Result<Response, ServiceError> {
    let form = BookForm::from_form(&FormData::parse(&body));
    state.respond(state.svc.book_create_post(form).await)
}

async fn delete_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.book_delete_get(&id).await)
}

async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.book_delete_post(&id).await)
}

async fn update_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ServiceError> {
    state.respond(state.svc.book_update_get(&id).await)
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, ServiceError> {
    let form = BookForm::from_form(&FormData::parse(&body));
    state.respond(state.svc.book_update_post(&id, form).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use super::super::{router, testing::call};
    use super::*;
    use crate::service::testing::*;

    #[tokio::test]
    async fn create_with_several_genres() {
        let (svc, _) = service();
        let author = seed_author(&svc, "Ursula", "Le Guin");
        let sf = seed_genre(&svc, "Science Fiction");
        let fantasy = seed_genre(&svc, "Fantasy");
        let svc = Arc::new(svc);
        let router = router(AppState::new(svc.clone()));

        let form = format!(
            "title=The+Dispossessed&author={}&summary=Anarres.&isbn=0060125632&genre={}&genre={}",
            author.id, sf.id, fantasy.id
        );
        let (status, location, _) = call(&router, "POST", "/catalog/book/create", Some(&form)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let saved = svc.books.find_all().unwrap().remove(0);
        assert_eq!(saved.genre, vec![sf.id.clone(), fantasy.id.clone()]);
        assert_eq!(location, Some(saved.url()));

        let (status, _, body) = call(&router, "GET", &saved.url(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"], "book_detail");
        assert_eq!(body["book"]["author"]["name"], "Le Guin, Ursula");
    }
}
