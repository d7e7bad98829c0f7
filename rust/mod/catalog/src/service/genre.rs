use serde_json::{json, Value};
use tracing::{debug, info};

use locallib_core::ServiceError;

use super::{blocking, books_in_genre, on, CatalogService, Page};
use crate::form::{escape, FieldError, FormData};
use crate::model::{Book, Genre};

pub const LIST_URL: &str = "/catalog/genres";

#[derive(Debug, Clone, Default)]
pub struct GenreForm {
    pub name: String,
}

impl GenreForm {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            name: form.get("name").to_string(),
        }
    }
}

pub fn check_genre(form: &GenreForm) -> (Genre, Vec<FieldError>) {
    let mut errors = Vec::new();
    let name = form.name.trim();
    if name.chars().count() < 3 {
        errors.push(FieldError::new(
            "name",
            "Genre name must contain at least 3 characters",
            name,
        ));
    }
    let candidate = Genre {
        id: String::new(),
        name: escape(name),
    };
    (candidate, errors)
}

fn genre_books(books: &[Book]) -> Vec<Value> {
    books
        .iter()
        .map(|b| json!({"id": b.id, "title": b.title, "summary": b.summary, "url": b.url()}))
        .collect()
}

impl CatalogService {
    // ── Genre ──

    pub async fn genre_list(&self) -> Result<Page, ServiceError> {
        let mut genres = on(&self.genres, |c| c.find_all()).await?;
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        let list: Vec<Value> = genres.iter().map(Genre::view).collect();
        Ok(Page::render(
            "genre_list",
            json!({"title": "Genre List", "genre_list": list}),
        ))
    }

    async fn genre_with_books(&self, id: &str) -> Result<(Option<Genre>, Vec<Book>), ServiceError> {
        let genres = self.genres.clone();
        let books = self.books.clone();
        let (g_id, b_id) = (id.to_string(), id.to_string());
        tokio::try_join!(
            blocking(move || genres.find_by_id(&g_id)),
            blocking(move || books_in_genre(&books, &b_id)),
        )
    }

    pub async fn genre_detail(&self, id: &str) -> Result<Page, ServiceError> {
        let (genre, books) = self.genre_with_books(id).await?;
        let genre = genre.ok_or_else(|| ServiceError::NotFound("Genre not found".into()))?;
        Ok(Page::render(
            "genre_detail",
            json!({
                "title": "Genre Detail",
                "genre": genre.view(),
                "genre_books": genre_books(&books),
            }),
        ))
    }

    pub async fn genre_create_get(&self) -> Result<Page, ServiceError> {
        Ok(Page::render("genre_form", json!({"title": "Create Genre"})))
    }

    /// Create a genre, or send the user to the existing one with the same
    /// name (compared case-insensitively).
    pub async fn genre_create_post(&self, form: GenreForm) -> Result<Page, ServiceError> {
        let (candidate, errors) = check_genre(&form);
        if !errors.is_empty() {
            return Ok(Page::render(
                "genre_form",
                json!({
                    "title": "Create Genre",
                    "genre": candidate.view(),
                    "errors": errors,
                }),
            ));
        }

        let wanted = candidate.name.to_lowercase();
        if let Some(existing) = on(&self.genres, |c| c.find_all())
            .await?
            .into_iter()
            .find(|g| g.name.to_lowercase() == wanted)
        {
            debug!("genre {:?} already exists as {}", candidate.name, existing.id);
            return Ok(Page::redirect(existing.url()));
        }

        let saved = on(&self.genres, move |c| c.create(candidate)).await?;
        info!("created genre {} ({})", saved.id, saved.name);
        Ok(Page::redirect(saved.url()))
    }

    pub async fn genre_delete_get(&self, id: &str) -> Result<Page, ServiceError> {
        let (genre, books) = self.genre_with_books(id).await?;
        let Some(genre) = genre else {
            return Ok(Page::redirect(LIST_URL));
        };
        Ok(Page::render(
            "genre_delete",
            json!({
                "title": "Delete Genre",
                "genre": genre.view(),
                "genre_books": genre_books(&books),
            }),
        ))
    }

    pub async fn genre_delete_post(&self, id: &str) -> Result<Page, ServiceError> {
        let (genre, books) = self.genre_with_books(id).await?;
        let Some(genre) = genre else {
            return Ok(Page::redirect(LIST_URL));
        };
        if !books.is_empty() {
            debug!("genre {} still used by {} book(s), not deleting", id, books.len());
            return Ok(Page::render(
                "genre_delete",
                json!({
                    "title": "Delete Genre",
                    "genre": genre.view(),
                    "genre_books": genre_books(&books),
                }),
            ));
        }
        let target = id.to_string();
        on(&self.genres, move |c| c.delete_by_id(&target)).await?;
        info!("deleted genre {}", id);
        Ok(Page::redirect(LIST_URL))
    }

    pub async fn genre_update_get(&self, id: &str) -> Result<Page, ServiceError> {
        let target = id.to_string();
        let genre = on(&self.genres, move |c| c.find_by_id(&target))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Genre not found".into()))?;
        Ok(Page::render(
            "genre_form",
            json!({"title": "Update Genre", "genre": genre.view()}),
        ))
    }

    pub async fn genre_update_post(&self, id: &str, form: GenreForm) -> Result<Page, ServiceError> {
        let (mut candidate, errors) = check_genre(&form);
        candidate.id = id.to_string();
        if !errors.is_empty() {
            return Ok(Page::render(
                "genre_form",
                json!({
                    "title": "Update Genre",
                    "genre": candidate.view(),
                    "errors": errors,
                }),
            ));
        }

        let target = id.to_string();
        let updated = on(&self.genres, move |c| c.update_by_id(&target, candidate))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Genre not found".into()))?;
        info!("updated genre {}", id);
        Ok(Page::redirect(updated.url()))
    }
}
