use serde_json::json;

use locallib_core::ServiceError;

use super::{blocking, CatalogService, Page};
use crate::model::BookStatus;

impl CatalogService {
    // ── Home ──

    /// Record counts for the home page, read side by side.
    pub async fn index(&self) -> Result<Page, ServiceError> {
        let books = self.books.clone();
        let instances = self.instances.clone();
        let available = self.instances.clone();
        let authors = self.authors.clone();
        let genres = self.genres.clone();

        let (book_count, instance_count, available_count, author_count, genre_count) = tokio::try_join!(
            blocking(move || books.count()),
            blocking(move || instances.count()),
            blocking(move || {
                Ok(available
                    .find_all()?
                    .iter()
                    .filter(|i| i.status() == Some(BookStatus::Available))
                    .count())
            }),
            blocking(move || authors.count()),
            blocking(move || genres.count()),
        )?;

        Ok(Page::render(
            "index",
            json!({
                "title": "Local Library Home",
                "book_count": book_count,
                "book_instance_count": instance_count,
                "book_instance_available_count": available_count,
                "author_count": author_count,
                "genre_count": genre_count,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::service::testing::*;

    #[tokio::test]
    async fn counts_every_collection() {
        let (svc, _) = service();
        let author = seed_author(&svc, "Frank", "Herbert");
        let sf = seed_genre(&svc, "Science Fiction");
        let book = seed_book(&svc, "Dune", &author, &[&sf]);
        seed_instance(&svc, &book, "Available");
        seed_instance(&svc, &book, "Loaned");
        seed_instance(&svc, &book, "Available");

        let page = svc.index().await.unwrap();
        let ctx = page.context().unwrap();
        assert_eq!(ctx["book_count"], 1);
        assert_eq!(ctx["book_instance_count"], 3);
        assert_eq!(ctx["book_instance_available_count"], 2);
        assert_eq!(ctx["author_count"], 1);
        assert_eq!(ctx["genre_count"], 1);
    }
}
