use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use locallib_core::ServiceError;
use locallib_store::Document;

use super::require_text;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Book {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// Author id.
    pub author: String,
    pub summary: String,
    pub isbn: String,
    /// Genre ids.
    #[serde(default)]
    pub genre: Vec<String>,
}

impl Book {
    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }

    /// Stored fields plus url, references left as ids.
    pub fn view(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "author": self.author,
            "summary": self.summary,
            "isbn": self.isbn,
            "genre": self.genre,
            "url": self.url(),
        })
    }

    /// Id, title and url only, for selection lists.
    pub fn title_view(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "url": self.url(),
        })
    }
}

impl Document for Book {
    fn kv_prefix() -> &'static str {
        "catalog:book:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn assign_key(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn check(&self) -> Result<(), ServiceError> {
        require_text("Book", "title", &self.title, None)?;
        require_text("Book", "author", &self.author, None)?;
        require_text("Book", "summary", &self.summary, None)?;
        require_text("Book", "isbn", &self.isbn, None)
    }
}
