pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

pub use author::Author;
pub use book::Book;
pub use book_instance::{BookInstance, BookStatus};
pub use genre::Genre;

use locallib_core::ServiceError;

/// Schema rule shared by the models: required, at most `max` characters.
pub(crate) fn require_text(
    collection: &str,
    field: &str,
    value: &str,
    max: Option<usize>,
) -> Result<(), ServiceError> {
    if value.is_empty() {
        return Err(ServiceError::Validation(format!(
            "{}: `{}` is required",
            collection, field
        )));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(ServiceError::Validation(format!(
                "{}: `{}` is longer than the maximum allowed length ({})",
                collection, field, max
            )));
        }
    }
    Ok(())
}
