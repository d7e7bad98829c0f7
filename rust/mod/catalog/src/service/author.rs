use serde_json::{json, Value};
use tracing::{debug, info};

use locallib_core::ServiceError;

use super::{blocking, books_by_author, on, CatalogService, Page};
use crate::form::{escape, is_alphanumeric, FieldError, FormData};
use crate::format::parse_iso_date;
use crate::model::{Author, Book};

pub const LIST_URL: &str = "/catalog/authors";

#[derive(Debug, Clone, Default)]
pub struct AuthorForm {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: String,
    pub date_of_death: String,
}

impl AuthorForm {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            first_name: form.get("first_name").to_string(),
            family_name: form.get("family_name").to_string(),
            date_of_birth: form.get("date_of_birth").to_string(),
            date_of_death: form.get("date_of_death").to_string(),
        }
    }
}

fn check_name(
    field: &str,
    raw: &str,
    missing: &str,
    bad_chars: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, missing, value));
    } else if !is_alphanumeric(value) {
        errors.push(FieldError::new(field, bad_chars, value));
    }
    escape(value)
}

fn check_date(
    field: &str,
    raw: &str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<chrono::NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_iso_date(raw);
    if parsed.is_none() {
        errors.push(FieldError::new(field, message, raw));
    }
    parsed
}

/// Sanitize and check an author submission. Create and update share it.
pub fn check_author(form: &AuthorForm) -> (Author, Vec<FieldError>) {
    let mut errors = Vec::new();
    let first_name = check_name(
        "first_name",
        &form.first_name,
        "First name must be specified.",
        "First name has non-alphanumeric characters.",
        &mut errors,
    );
    let family_name = check_name(
        "family_name",
        &form.family_name,
        "Family name must be specified.",
        "Family name has non-alphanumeric characters.",
        &mut errors,
    );
    let date_of_birth = check_date(
        "date_of_birth",
        &form.date_of_birth,
        "Invalid date of birth",
        &mut errors,
    );
    let date_of_death = check_date(
        "date_of_death",
        &form.date_of_death,
        "Invalid date of death",
        &mut errors,
    );

    let candidate = Author {
        id: String::new(),
        first_name,
        family_name,
        date_of_birth,
        date_of_death,
    };
    (candidate, errors)
}

fn author_books(books: &[Book]) -> Vec<Value> {
    books
        .iter()
        .map(|b| json!({"id": b.id, "title": b.title, "summary": b.summary, "url": b.url()}))
        .collect()
}

impl CatalogService {
    // ── Author ──

    pub async fn author_list(&self) -> Result<Page, ServiceError> {
        let mut authors = on(&self.authors, |c| c.find_all()).await?;
        authors.sort_by(|a, b| a.family_name.cmp(&b.family_name));
        let list: Vec<Value> = authors.iter().map(Author::view).collect();
        Ok(Page::render(
            "author_list",
            json!({"title": "Author List", "author_list": list}),
        ))
    }

    /// Fetch an author and their books side by side.
    async fn author_with_books(&self, id: &str) -> Result<(Option<Author>, Vec<Book>), ServiceError> {
        let authors = self.authors.clone();
        let books = self.books.clone();
        let (a_id, b_id) = (id.to_string(), id.to_string());
        tokio::try_join!(
            blocking(move || authors.find_by_id(&a_id)),
            blocking(move || books_by_author(&books, &b_id)),
        )
    }

    pub async fn author_detail(&self, id: &str) -> Result<Page, ServiceError> {
        let (author, books) = self.author_with_books(id).await?;
        let author = author.ok_or_else(|| ServiceError::NotFound("Author not found".into()))?;
        Ok(Page::render(
            "author_detail",
            json!({
                "title": "Author Detail",
                "author": author.view(),
                "author_books": author_books(&books),
            }),
        ))
    }

    pub async fn author_create_get(&self) -> Result<Page, ServiceError> {
        Ok(Page::render("author_form", json!({"title": "Create Author"})))
    }

    pub async fn author_create_post(&self, form: AuthorForm) -> Result<Page, ServiceError> {
        let (candidate, errors) = check_author(&form);
        if !errors.is_empty() {
            debug!("author create rejected: {} field error(s)", errors.len());
            return Ok(Page::render(
                "author_form",
                json!({
                    "title": "Create Author",
                    "author": candidate.view(),
                    "errors": errors,
                }),
            ));
        }

        let saved = on(&self.authors, move |c| c.create(candidate)).await?;
        info!("created author {} ({})", saved.id, saved.name());
        Ok(Page::redirect(saved.url()))
    }

    pub async fn author_delete_get(&self, id: &str) -> Result<Page, ServiceError> {
        let (author, books) = self.author_with_books(id).await?;
        let Some(author) = author else {
            debug!("author {} not found, back to list", id);
            return Ok(Page::redirect(LIST_URL));
        };
        Ok(Page::render(
            "author_delete",
            json!({
                "title": "Delete Author",
                "author": author.view(),
                "author_books": author_books(&books),
            }),
        ))
    }

    /// Delete an author who has no books. An author still credited on a
    /// book is kept and the confirmation page lists those books.
    pub async fn author_delete_post(&self, id: &str) -> Result<Page, ServiceError> {
        let (author, books) = self.author_with_books(id).await?;
        let Some(author) = author else {
            return Ok(Page::redirect(LIST_URL));
        };
        if !books.is_empty() {
            debug!("author {} still has {} book(s), not deleting", id, books.len());
            return Ok(Page::render(
                "author_delete",
                json!({
                    "title": "Delete Author",
                    "author": author.view(),
                    "author_books": author_books(&books),
                }),
            ));
        }
        let target = id.to_string();
        on(&self.authors, move |c| c.delete_by_id(&target)).await?;
        info!("deleted author {}", id);
        Ok(Page::redirect(LIST_URL))
    }

    pub async fn author_update_get(&self, id: &str) -> Result<Page, ServiceError> {
        let target = id.to_string();
        let author = on(&self.authors, move |c| c.find_by_id(&target))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Author not found".into()))?;
        Ok(Page::render(
            "author_form",
            json!({"title": "Update Author", "author": author.view()}),
        ))
    }

    pub async fn author_update_post(&self, id: &str, form: AuthorForm) -> Result<Page, ServiceError> {
        let (mut candidate, errors) = check_author(&form);
        candidate.id = id.to_string();
        if !errors.is_empty() {
            return Ok(Page::render(
                "author_form",
                json!({
                    "title": "Update Author",
                    "author": candidate.view(),
                    "errors": errors,
                }),
            ));
        }

        let target = id.to_string();
        let updated = on(&self.authors, move |c| c.update_by_id(&target, candidate))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Author not found".into()))?;
        info!("updated author {}", id);
        Ok(Page::redirect(updated.url()))
    }
}
