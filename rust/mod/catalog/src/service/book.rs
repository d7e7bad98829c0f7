use std::collections::HashMap;

use serde_json::{json, Value};
use tracing::{debug, info};

use locallib_core::ServiceError;

use super::{blocking, instances_of, on, CatalogService, Page};
use crate::form::{escape, FieldError, FormData};
use crate::model::{Author, Book, BookInstance, Genre};

pub const LIST_URL: &str = "/catalog/books";

#[derive(Debug, Clone, Default)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<String>,
}

impl BookForm {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            title: form.get("title").to_string(),
            author: form.get("author").to_string(),
            summary: form.get("summary").to_string(),
            isbn: form.get("isbn").to_string(),
            genre: form.get_all("genre").into_iter().map(str::to_string).collect(),
        }
    }
}

fn required(field: &str, raw: &str, message: &str, errors: &mut Vec<FieldError>) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, message, value));
    }
    escape(value)
}

/// Sanitize and check a book submission. Create and update share it.
pub fn check_book(form: &BookForm) -> (Book, Vec<FieldError>) {
    let mut errors = Vec::new();
    let title = required("title", &form.title, "Title must not be empty.", &mut errors);
    let author = required("author", &form.author, "Author must not be empty.", &mut errors);
    let summary = required("summary", &form.summary, "Summary must not be empty.", &mut errors);
    let isbn = required("isbn", &form.isbn, "ISBN must not be empty", &mut errors);

    let candidate = Book {
        id: String::new(),
        title,
        author,
        summary,
        isbn,
        genre: form.genre.iter().map(|g| escape(g)).collect(),
    };
    (candidate, errors)
}

/// Genres for the checkbox group, marking the ones the book carries.
fn genre_choices(genres: &[Genre], selected: &[String]) -> Vec<Value> {
    let mut genres: Vec<&Genre> = genres.iter().collect();
    genres.sort_by(|a, b| a.name.cmp(&b.name));
    genres
        .into_iter()
        .map(|g| {
            let mut v = g.view();
            v["checked"] = Value::Bool(selected.contains(&g.id));
            v
        })
        .collect()
}

fn author_choices(authors: &[Author]) -> Vec<Value> {
    let mut authors: Vec<&Author> = authors.iter().collect();
    authors.sort_by(|a, b| a.family_name.cmp(&b.family_name));
    authors.into_iter().map(Author::view).collect()
}

fn instance_views(instances: &[BookInstance]) -> Vec<Value> {
    instances.iter().map(BookInstance::view).collect()
}

impl CatalogService {
    // ── Book ──

    /// A book with its author and genres resolved.
    async fn book_view(&self, book: &Book) -> Result<Value, ServiceError> {
        let authors = self.authors.clone();
        let genres = self.genres.clone();
        let author_id = book.author.clone();
        let genre_ids = book.genre.clone();
        let (author, resolved) = tokio::try_join!(
            blocking(move || authors.find_by_id(&author_id)),
            blocking(move || genres.populate(genre_ids.iter().map(String::as_str))),
        )?;

        let mut v = book.view();
        v["author"] = author.map(|a| a.view()).unwrap_or(Value::Null);
        v["genre"] = Value::Array(
            book.genre
                .iter()
                .filter_map(|id| resolved.get(id).map(Genre::view))
                .collect(),
        );
        Ok(v)
    }

    /// Flag an author id that names no stored author.
    async fn check_author_ref(
        &self,
        candidate: &Book,
        errors: &mut Vec<FieldError>,
    ) -> Result<(), ServiceError> {
        if candidate.author.is_empty() {
            return Ok(());
        }
        let author_id = candidate.author.clone();
        if on(&self.authors, move |c| c.find_by_id(&author_id)).await?.is_none() {
            errors.push(FieldError::new("author", "Author not found", &candidate.author));
        }
        Ok(())
    }

    pub async fn book_list(&self) -> Result<Page, ServiceError> {
        let books = self.books.clone();
        let authors = self.authors.clone();
        let (mut books, authors): (Vec<Book>, HashMap<String, Author>) = blocking(move || {
            let books = books.find_all()?;
            let authors = authors.populate(books.iter().map(|b| b.author.as_str()))?;
            Ok((books, authors))
        })
        .await?;
        books.sort_by(|a, b| a.title.cmp(&b.title));

        let list: Vec<Value> = books
            .iter()
            .map(|b| {
                let mut v = b.view();
                v["author"] = authors.get(&b.author).map(Author::view).unwrap_or(Value::Null);
                v
            })
            .collect();

        Ok(Page::render("book_list", json!({"title": "Book List", "book_list": list})))
    }

    async fn book_with_instances(
        &self,
        id: &str,
    ) -> Result<(Option<Book>, Vec<BookInstance>), ServiceError> {
        let books = self.books.clone();
        let instances = self.instances.clone();
        let (b_id, i_id) = (id.to_string(), id.to_string());
        tokio::try_join!(
            blocking(move || books.find_by_id(&b_id)),
            blocking(move || instances_of(&instances, &i_id)),
        )
    }

    pub async fn book_detail(&self, id: &str) -> Result<Page, ServiceError> {
        let (book, instances) = self.book_with_instances(id).await?;
        let book = book.ok_or_else(|| ServiceError::NotFound("Book not found".into()))?;
        Ok(Page::render(
            "book_detail",
            json!({
                "title": book.title,
                "book": self.book_view(&book).await?,
                "book_instances": instance_views(&instances),
            }),
        ))
    }

    async fn authors_and_genres(&self) -> Result<(Vec<Author>, Vec<Genre>), ServiceError> {
        let authors = self.authors.clone();
        let genres = self.genres.clone();
        tokio::try_join!(
            blocking(move || authors.find_all()),
            blocking(move || genres.find_all()),
        )
    }

    pub async fn book_create_get(&self) -> Result<Page, ServiceError> {
        let (authors, genres) = self.authors_and_genres().await?;
        Ok(Page::render(
            "book_form",
            json!({
                "title": "Create Book",
                "authors": author_choices(&authors),
                "genres": genre_choices(&genres, &[]),
            }),
        ))
    }

    pub async fn book_create_post(&self, form: BookForm) -> Result<Page, ServiceError> {
        let (candidate, mut errors) = check_book(&form);
        self.check_author_ref(&candidate, &mut errors).await?;
        if !errors.is_empty() {
            debug!("book create rejected: {} field error(s)", errors.len());
            let (authors, genres) = self.authors_and_genres().await?;
            return Ok(Page::render(
                "book_form",
                json!({
                    "title": "Create Book",
                    "authors": author_choices(&authors),
                    "genres": genre_choices(&genres, &candidate.genre),
                    "book": candidate.view(),
                    "errors": errors,
                }),
            ));
        }

        let saved = on(&self.books, move |c| c.create(candidate)).await?;
        info!("created book {} ({})", saved.id, saved.title);
        Ok(Page::redirect(saved.url()))
    }

    pub async fn book_delete_get(&self, id: &str) -> Result<Page, ServiceError> {
        let (book, instances) = self.book_with_instances(id).await?;
        let Some(book) = book else {
            debug!("book {} not found, back to list", id);
            return Ok(Page::redirect(LIST_URL));
        };
        Ok(Page::render(
            "book_delete",
            json!({
                "title": "Delete Book",
                "book": self.book_view(&book).await?,
                "book_instances": instance_views(&instances),
            }),
        ))
    }

    /// Delete a book that no copy references. Otherwise the copies are
    /// listed and nothing is deleted.
    pub async fn book_delete_post(&self, id: &str) -> Result<Page, ServiceError> {
        let (book, instances) = self.book_with_instances(id).await?;
        let Some(book) = book else {
            return Ok(Page::redirect(LIST_URL));
        };
        if !instances.is_empty() {
            debug!("book {} still has {} copies, not deleting", id, instances.len());
            return Ok(Page::render(
                "book_delete",
                json!({
                    "title": "Delete Book",
                    "book": self.book_view(&book).await?,
                    "book_instances": instance_views(&instances),
                }),
            ));
        }
        let target = id.to_string();
        on(&self.books, move |c| c.delete_by_id(&target)).await?;
        info!("deleted book {}", id);
        Ok(Page::redirect(LIST_URL))
    }

    pub async fn book_update_get(&self, id: &str) -> Result<Page, ServiceError> {
        let books = self.books.clone();
        let authors = self.authors.clone();
        let genres = self.genres.clone();
        let target = id.to_string();

        let (book, authors, genres) = tokio::try_join!(
            blocking(move || books.find_by_id(&target)),
            blocking(move || authors.find_all()),
            blocking(move || genres.find_all()),
        )?;
        let book = book.ok_or_else(|| ServiceError::NotFound("Book not found".into()))?;

        Ok(Page::render(
            "book_form",
            json!({
                "title": "Update Book",
                "authors": author_choices(&authors),
                "genres": genre_choices(&genres, &book.genre),
                "book": book.view(),
            }),
        ))
    }

    pub async fn book_update_post(&self, id: &str, form: BookForm) -> Result<Page, ServiceError> {
        let (mut candidate, mut errors) = check_book(&form);
        candidate.id = id.to_string();
        self.check_author_ref(&candidate, &mut errors).await?;
        if !errors.is_empty() {
            let (authors, genres) = self.authors_and_genres().await?;
            return Ok(Page::render(
                "book_form",
                json!({
                    "title": "Update Book",
                    "authors": author_choices(&authors),
                    "genres": genre_choices(&genres, &candidate.genre),
                    "book": candidate.view(),
                    "errors": errors,
                }),
            ));
        }

        let target = id.to_string();
        let updated = on(&self.books, move |c| c.update_by_id(&target, candidate))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book not found".into()))?;
        info!("updated book {}", id);
        Ok(Page::redirect(updated.url()))
    }
}
