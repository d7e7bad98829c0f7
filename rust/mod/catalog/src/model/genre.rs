use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use locallib_core::ServiceError;
use locallib_store::Document;

/// A book genre, e.g. "Science Fiction".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

impl Genre {
    pub fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }

    pub fn view(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "url": self.url(),
        })
    }
}

impl Document for Genre {
    fn kv_prefix() -> &'static str {
        "catalog:genre:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn assign_key(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn check(&self) -> Result<(), ServiceError> {
        let len = self.name.chars().count();
        if !(3..=100).contains(&len) {
            return Err(ServiceError::Validation(
                "Genre: `name` must be between 3 and 100 characters".into(),
            ));
        }
        Ok(())
    }
}
