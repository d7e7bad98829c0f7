//! Catalog controllers.
//!
//! Every operation returns a [`Page`]: either a view to render or a URL
//! to redirect to. Form submissions that fail their rules are never
//! errors; the form is rendered again with the sanitized input and a
//! list of [`FieldError`](crate::form::FieldError)s.

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod index;

use std::sync::Arc;

use serde_json::Value;

use locallib_core::ServiceError;
use locallib_kv::KVStore;
use locallib_store::{Collection, Document};

use crate::format::parse_iso_date;
use crate::model::{Author, Book, BookInstance, Genre};

pub use crate::view::Page;

/// Holds one collection per record type.
pub struct CatalogService {
    pub(crate) books: Collection<Book>,
    pub(crate) authors: Collection<Author>,
    pub(crate) genres: Collection<Genre>,
    pub(crate) instances: Collection<BookInstance>,
}

impl CatalogService {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            books: Collection::new(Arc::clone(&kv)),
            authors: Collection::new(Arc::clone(&kv)),
            genres: Collection::new(Arc::clone(&kv)),
            instances: Collection::new(kv),
        }
    }

    // ── Shared lookups ──

    /// All books as {id, title, url}, sorted by title.
    pub(crate) fn book_options(books: Vec<Book>) -> Vec<Value> {
        let mut books = books;
        books.sort_by(|a, b| a.title.cmp(&b.title));
        books.iter().map(Book::title_view).collect()
    }
}

pub(crate) fn books_by_author(
    books: &Collection<Book>,
    author_id: &str,
) -> Result<Vec<Book>, ServiceError> {
    Ok(books
        .find_all()?
        .into_iter()
        .filter(|b| b.author == author_id)
        .collect())
}

pub(crate) fn books_in_genre(
    books: &Collection<Book>,
    genre_id: &str,
) -> Result<Vec<Book>, ServiceError> {
    Ok(books
        .find_all()?
        .into_iter()
        .filter(|b| b.genre.iter().any(|g| g == genre_id))
        .collect())
}

pub(crate) fn instances_of(
    instances: &Collection<BookInstance>,
    book_id: &str,
) -> Result<Vec<BookInstance>, ServiceError> {
    Ok(instances
        .find_all()?
        .into_iter()
        .filter(|i| i.book == book_id)
        .collect())
}

/// Run blocking store work on the blocking pool. Used with
/// `tokio::try_join!` so independent reads overlap and the first failure
/// fails the whole join.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking read failed: {}", e)))?
}

/// Run one call against a collection on the blocking pool. Every store
/// access in the controllers goes through here or [`blocking`].
pub(crate) async fn on<D, F, T>(collection: &Collection<D>, f: F) -> Result<T, ServiceError>
where
    D: Document,
    F: FnOnce(&Collection<D>) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let collection = collection.clone();
    blocking(move || f(&collection)).await
}

/// Convert an optional date field the way the store would on write: empty
/// means absent, anything else must parse.
pub(crate) fn cast_date(field: &str, raw: &str) -> Result<Option<chrono::NaiveDate>, ServiceError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_iso_date(raw).map(Some).ok_or_else(|| {
        ServiceError::Validation(format!("cast to date failed for `{}`: \"{}\"", field, raw))
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread::ThreadId;

    use locallib_kv::{KVError, MemoryStore};

    use crate::service::author::AuthorForm;
    use crate::service::book::BookForm;
    use crate::service::book_instance::BookInstanceForm;
    use crate::service::genre::GenreForm;

    /// Remembers which thread served each store call.
    struct ThreadRecorder {
        inner: MemoryStore,
        threads: Mutex<Vec<ThreadId>>,
    }

    impl ThreadRecorder {
        fn record(&self) {
            self.threads.lock().unwrap().push(std::thread::current().id());
        }
    }

    impl KVStore for ThreadRecorder {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
            self.record();
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
            self.record();
            self.inner.set(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), KVError> {
            self.record();
            self.inner.delete(key)
        }

        fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
            self.record();
            self.inner.scan(prefix)
        }
    }

    fn id_of(page: &Page) -> String {
        page.redirect_target().unwrap().rsplit('/').next().unwrap().to_string()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn store_calls_never_run_on_the_runtime_thread() {
        let recorder = Arc::new(ThreadRecorder {
            inner: MemoryStore::new(),
            threads: Mutex::new(Vec::new()),
        });
        let kv: Arc<dyn KVStore> = recorder.clone();
        let svc = CatalogService::new(kv);
        let runtime_thread = std::thread::current().id();

        let genre = id_of(&svc.genre_create_post(GenreForm { name: "Poetry".into() }).await.unwrap());
        let author = id_of(
            &svc.author_create_post(AuthorForm {
                first_name: "Mary".into(),
                family_name: "Oliver".into(),
                ..Default::default()
            })
            .await
            .unwrap(),
        );
        let book = id_of(
            &svc.book_create_post(BookForm {
                title: "Dream Work".into(),
                author: author.clone(),
                summary: "Poems.".into(),
                isbn: "0871130696".into(),
                genre: vec![genre.clone()],
            })
            .await
            .unwrap(),
        );
        let copy = id_of(
            &svc.bookinstance_create_post(BookInstanceForm {
                book: book.clone(),
                imprint: "Atlantic".into(),
                status: Some("Available".into()),
                due_back: String::new(),
            })
            .await
            .unwrap(),
        );

        svc.index().await.unwrap();
        svc.genre_list().await.unwrap();
        svc.genre_update_get(&genre).await.unwrap();
        svc.author_list().await.unwrap();
        svc.author_update_get(&author).await.unwrap();
        svc.book_list().await.unwrap();
        svc.book_detail(&book).await.unwrap();
        svc.bookinstance_list().await.unwrap();
        svc.bookinstance_detail(&copy).await.unwrap();
        svc.bookinstance_delete_get(&copy).await.unwrap();
        svc.bookinstance_delete_post(&copy).await.unwrap();

        let threads = recorder.threads.lock().unwrap();
        assert!(!threads.is_empty());
        assert!(threads.iter().all(|t| *t != runtime_thread));
    }

    #[test]
    fn cast_date_accepts_blank_and_iso() {
        assert_eq!(cast_date("due_back", "").unwrap(), None);
        assert_eq!(cast_date("due_back", "  ").unwrap(), None);
        assert_eq!(
            cast_date("due_back", "2024-01-15").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert!(matches!(
            cast_date("due_back", "soon"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn blocking_propagates_inner_error() {
        let err = blocking(|| -> Result<(), ServiceError> {
            Err(ServiceError::Storage("boom".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
