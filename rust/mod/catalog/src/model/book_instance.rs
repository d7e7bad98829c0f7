use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use locallib_core::ServiceError;
use locallib_store::Document;

use super::{require_text, Book};
use crate::format::{date_html, date_med};

/// Loan status of a physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookStatus {
    pub const ALL: [BookStatus; 4] = [
        BookStatus::Available,
        BookStatus::Maintenance,
        BookStatus::Loaned,
        BookStatus::Reserved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Maintenance => "Maintenance",
            BookStatus::Loaned => "Loaned",
            BookStatus::Reserved => "Reserved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

/// A physical copy of a book.
///
/// `status` is kept as submitted so a form can be redisplayed verbatim;
/// the schema check rejects anything outside [`BookStatus`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookInstance {
    #[serde(default)]
    pub id: String,
    /// Book id.
    pub book: String,
    pub imprint: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_back: Option<NaiveDate>,
}

fn default_status() -> String {
    BookStatus::default().as_str().to_string()
}

impl Default for BookInstance {
    fn default() -> Self {
        Self {
            id: String::new(),
            book: String::new(),
            imprint: String::new(),
            status: default_status(),
            due_back: None,
        }
    }
}

impl BookInstance {
    pub fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }

    pub fn status(&self) -> Option<BookStatus> {
        BookStatus::parse(&self.status)
    }

    pub fn due_back_formatted(&self) -> String {
        date_med(self.due_back)
    }

    pub fn due_back_formatted_html(&self) -> String {
        date_html(self.due_back)
    }

    /// The copy with `book` left as an id.
    pub fn view(&self) -> Value {
        self.view_with_book(None)
    }

    /// The copy with `book` replaced by the resolved record when given.
    pub fn view_with_book(&self, book: Option<&Book>) -> Value {
        let book = match book {
            Some(b) => b.view(),
            None => Value::String(self.book.clone()),
        };
        json!({
            "id": self.id,
            "book": book,
            "imprint": self.imprint,
            "status": self.status,
            "due_back": self.due_back,
            "due_back_formatted": self.due_back_formatted(),
            "due_back_formatted_html": self.due_back_formatted_html(),
            "url": self.url(),
        })
    }
}

impl Document for BookInstance {
    fn kv_prefix() -> &'static str {
        "catalog:bookinstance:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn assign_key(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn check(&self) -> Result<(), ServiceError> {
        require_text("BookInstance", "book", &self.book, None)?;
        require_text("BookInstance", "imprint", &self.imprint, None)?;
        if self.status().is_none() {
            return Err(ServiceError::Validation(format!(
                "BookInstance: `{}` is not a valid value for `status`",
                self.status
            )));
        }
        Ok(())
    }
}
