use std::collections::HashMap;

use serde_json::json;
use tracing::{debug, info, warn};

use locallib_core::ServiceError;

use super::{blocking, cast_date, on, CatalogService, Page};
use crate::form::{escape, FieldError, FormData};
use crate::format::parse_iso_date;
use crate::model::{Book, BookInstance, BookStatus};

pub const LIST_URL: &str = "/catalog/bookinstances";

/// Raw fields of the book-copy form, exactly as submitted.
#[derive(Debug, Clone, Default)]
pub struct BookInstanceForm {
    pub book: String,
    pub imprint: String,
    /// None when the field was not sent at all.
    pub status: Option<String>,
    pub due_back: String,
}

impl BookInstanceForm {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            book: form.get("book").to_string(),
            imprint: form.get("imprint").to_string(),
            status: form.value("status").map(str::to_string),
            due_back: form.get("due_back").to_string(),
        }
    }
}

/// Sanitize and check a create submission.
///
/// The candidate is built whatever the outcome, so a rejected form can be
/// shown again with what the user typed.
pub fn check_create(form: &BookInstanceForm) -> (BookInstance, Vec<FieldError>) {
    let mut errors = Vec::new();

    let book = form.book.trim();
    if book.is_empty() {
        errors.push(FieldError::new("book", "Book must be specified", book));
    }

    let imprint = form.imprint.trim();
    if imprint.is_empty() {
        errors.push(FieldError::new("imprint", "Imprint must be specified", imprint));
    }

    let due_back = if form.due_back.is_empty() {
        None
    } else {
        let parsed = parse_iso_date(&form.due_back);
        if parsed.is_none() {
            errors.push(FieldError::new("due_back", "Invalid date", &form.due_back));
        }
        parsed
    };

    let candidate = BookInstance {
        id: String::new(),
        book: escape(book),
        imprint: escape(imprint),
        status: form
            .status
            .as_deref()
            .map(escape)
            .unwrap_or_else(|| BookStatus::default().as_str().to_string()),
        due_back,
    };
    (candidate, errors)
}

/// Check an update submission. Only the imprint has a rule; the other
/// fields go to the store as sent.
pub fn check_update(id: &str, form: &BookInstanceForm) -> (BookInstance, Vec<FieldError>) {
    let mut errors = Vec::new();

    let imprint = form.imprint.trim();
    if imprint.is_empty() {
        errors.push(FieldError::new("imprint", "Imprint must not be empty", imprint));
    }

    let candidate = BookInstance {
        id: id.to_string(),
        book: form.book.clone(),
        imprint: escape(imprint),
        status: form
            .status
            .clone()
            .unwrap_or_else(|| BookStatus::default().as_str().to_string()),
        due_back: cast_date("due_back", &form.due_back).unwrap_or(None),
    };
    (candidate, errors)
}

fn status_options() -> Vec<&'static str> {
    BookStatus::ALL.iter().map(|s| s.as_str()).collect()
}

impl CatalogService {
    // ── BookInstance ──

    pub async fn bookinstance_list(&self) -> Result<Page, ServiceError> {
        let instances = self.instances.clone();
        let books = self.books.clone();
        let (instances, books): (Vec<BookInstance>, HashMap<String, Book>) = blocking(move || {
            let instances = instances.find_all()?;
            let books = books.populate(instances.iter().map(|i| i.book.as_str()))?;
            Ok((instances, books))
        })
        .await?;

        let list: Vec<_> = instances
            .iter()
            .map(|i| i.view_with_book(books.get(&i.book)))
            .collect();

        Ok(Page::render(
            "bookinstance_list",
            json!({
                "title": "Book Instance List",
                "bookinstance_list": list,
            }),
        ))
    }

    pub async fn bookinstance_detail(&self, id: &str) -> Result<Page, ServiceError> {
        let target = id.to_string();
        let instance = on(&self.instances, move |c| c.find_by_id(&target))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book copy not found".into()))?;

        let book_id = instance.book.clone();
        let book = on(&self.books, move |c| c.find_by_id(&book_id)).await?;
        if book.is_none() {
            warn!("book instance {} references missing book {}", id, instance.book);
        }
        let title = book.as_ref().map(|b| b.title.as_str()).unwrap_or_default();

        Ok(Page::render(
            "bookinstance_detail",
            json!({
                "title": format!("Copy: {}", title),
                "bookinstance": instance.view_with_book(book.as_ref()),
            }),
        ))
    }

    pub async fn bookinstance_create_get(&self) -> Result<Page, ServiceError> {
        let books = on(&self.books, |c| c.find_all()).await?;
        Ok(Page::render(
            "bookinstance_form",
            json!({
                "title": "Create BookInstance",
                "book_list": Self::book_options(books),
                "status_list": status_options(),
            }),
        ))
    }

    pub async fn bookinstance_create_post(&self, form: BookInstanceForm) -> Result<Page, ServiceError> {
        let (candidate, mut errors) = check_create(&form);
        if !candidate.book.is_empty() {
            let book_id = candidate.book.clone();
            if on(&self.books, move |c| c.find_by_id(&book_id)).await?.is_none() {
                errors.push(FieldError::new("book", "Book not found", &candidate.book));
            }
        }

        if !errors.is_empty() {
            debug!("book instance create rejected: {} field error(s)", errors.len());
            let books = on(&self.books, |c| c.find_all()).await?;
            return Ok(Page::render(
                "bookinstance_form",
                json!({
                    "title": "Create BookInstance",
                    "book_list": Self::book_options(books),
                    "status_list": status_options(),
                    "selected_book": candidate.book,
                    "errors": errors,
                    "bookinstance": candidate.view(),
                }),
            ));
        }

        let saved = on(&self.instances, move |c| c.create(candidate)).await?;
        info!("created book instance {} of book {}", saved.id, saved.book);
        Ok(Page::redirect(saved.url()))
    }

    pub async fn bookinstance_delete_get(&self, id: &str) -> Result<Page, ServiceError> {
        let target = id.to_string();
        let Some(instance) = on(&self.instances, move |c| c.find_by_id(&target)).await? else {
            debug!("book instance {} not found, back to list", id);
            return Ok(Page::redirect(LIST_URL));
        };

        Ok(Page::render(
            "bookinstance_delete",
            json!({
                "title": "Delete Book Instance",
                "book_instance": instance.view(),
            }),
        ))
    }

    pub async fn bookinstance_delete_post(&self, id: &str) -> Result<Page, ServiceError> {
        let target = id.to_string();
        if on(&self.instances, move |c| c.delete_by_id(&target)).await?.is_some() {
            info!("deleted book instance {}", id);
        }
        Ok(Page::redirect(LIST_URL))
    }

    pub async fn bookinstance_update_get(&self, id: &str) -> Result<Page, ServiceError> {
        let instances = self.instances.clone();
        let books = self.books.clone();
        let target = id.to_string();

        let (instance, book_list) = tokio::try_join!(
            blocking(move || instances.find_by_id(&target)),
            blocking(move || books.find_all()),
        )?;

        let instance =
            instance.ok_or_else(|| ServiceError::NotFound("Book Instance not found".into()))?;

        Ok(Page::render(
            "bookinstance_form",
            json!({
                "title": "Update Book Instance",
                "bookinstance": instance.view(),
                "book_list": Self::book_options(book_list),
                "status_list": status_options(),
                "selected_book": instance.book,
            }),
        ))
    }

    pub async fn bookinstance_update_post(
        &self,
        id: &str,
        form: BookInstanceForm,
    ) -> Result<Page, ServiceError> {
        let (candidate, errors) = check_update(id, &form);

        if !errors.is_empty() {
            debug!("book instance {} update rejected", id);
            let books = on(&self.books, |c| c.find_all()).await?;
            return Ok(Page::render(
                "bookinstance_form",
                json!({
                    "title": "Update Book Instance",
                    "bookinstance": candidate.view(),
                    "book_list": Self::book_options(books),
                    "status_list": status_options(),
                    "selected_book": candidate.book,
                    "errors": errors,
                }),
            ));
        }

        // The due date has no form rule on update, so a bad value only
        // surfaces when the store casts it.
        let mut record = candidate;
        record.due_back = cast_date("due_back", &form.due_back)?;

        let target = id.to_string();
        let updated = on(&self.instances, move |c| c.update_by_id(&target, record))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book Instance not found".into()))?;
        info!("updated book instance {}", id);
        Ok(Page::redirect(updated.url()))
    }
}
