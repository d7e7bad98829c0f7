use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use locallib_core::ServiceError;
use locallib_store::Document;

use super::require_text;
use crate::format::{date_html, date_med};

/// An author. Only the fields below are stored; name, lifespan, url and
/// the formatted dates are computed each time they are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Author {
    #[serde(default)]
    pub id: String,
    pub first_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Family, First", or empty unless both parts are present.
    pub fn name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }

    pub fn date_of_birth_formatted(&self) -> String {
        date_med(self.date_of_birth)
    }

    pub fn date_of_death_formatted(&self) -> String {
        date_med(self.date_of_death)
    }

    pub fn date_of_birth_formatted_html(&self) -> String {
        date_html(self.date_of_birth)
    }

    pub fn date_of_death_formatted_html(&self) -> String {
        date_html(self.date_of_death)
    }

    /// Both formatted dates joined by " - ". The separator is kept even
    /// when one or both dates are missing.
    pub fn lifespan(&self) -> String {
        format!(
            "{} - {}",
            self.date_of_birth_formatted(),
            self.date_of_death_formatted()
        )
    }

    pub fn view(&self) -> Value {
        json!({
            "id": self.id,
            "first_name": self.first_name,
            "family_name": self.family_name,
            "date_of_birth": self.date_of_birth,
            "date_of_death": self.date_of_death,
            "name": self.name(),
            "lifespan": self.lifespan(),
            "url": self.url(),
            "date_of_birth_formatted": self.date_of_birth_formatted(),
            "date_of_death_formatted": self.date_of_death_formatted(),
            "date_of_birth_formatted_html": self.date_of_birth_formatted_html(),
            "date_of_death_formatted_html": self.date_of_death_formatted_html(),
        })
    }
}

impl Document for Author {
    fn kv_prefix() -> &'static str {
        "catalog:author:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn assign_key(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn check(&self) -> Result<(), ServiceError> {
        require_text("Author", "first_name", &self.first_name, Some(100))?;
        require_text("Author", "family_name", &self.family_name, Some(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austen() -> Author {
        Author {
            id: "a1".into(),
            first_name: "Jane".into(),
            family_name: "Austen".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1775, 12, 16),
            date_of_death: NaiveDate::from_ymd_opt(1817, 7, 18),
        }
    }

    #[test]
    fn full_name_needs_both_parts() {
        let mut a = austen();
        assert_eq!(a.name(), "Austen, Jane");
        a.first_name.clear();
        assert_eq!(a.name(), "");
        a.first_name = "Jane".into();
        a.family_name.clear();
        assert_eq!(a.name(), "");
    }

    #[test]
    fn lifespan_with_both_dates() {
        assert_eq!(austen().lifespan(), "Dec 16, 1775 - Jul 18, 1817");
    }

    #[test]
    fn lifespan_keeps_separator_when_dates_missing() {
        let mut a = austen();
        a.date_of_death = None;
        assert_eq!(a.lifespan(), "Dec 16, 1775 - ");
        a.date_of_birth = None;
        assert_eq!(a.lifespan(), " - ");
    }

    #[test]
    fn html_dates() {
        let mut a = austen();
        a.date_of_birth = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(a.date_of_birth_formatted_html(), "2024-01-15");
        a.date_of_death = None;
        assert_eq!(a.date_of_death_formatted_html(), "");
    }

    #[test]
    fn derived_fields_follow_stored_fields() {
        let mut a = austen();
        let before = a.view();
        a.family_name = "Brontë".into();
        a.date_of_birth = NaiveDate::from_ymd_opt(1816, 4, 21);
        let after = a.view();
        assert_eq!(before["name"], "Austen, Jane");
        assert_eq!(after["name"], "Brontë, Jane");
        assert_eq!(after["date_of_birth_formatted"], "Apr 21, 1816");
        assert_eq!(after["url"], "/catalog/author/a1");
    }

    #[test]
    fn derived_fields_are_not_stored() {
        let stored = serde_json::to_value(austen()).unwrap();
        assert!(stored.get("name").is_none());
        assert!(stored.get("lifespan").is_none());
        assert_eq!(stored["date_of_birth"], "1775-12-16");
    }

    #[test]
    fn schema_requires_bounded_names() {
        let mut a = austen();
        assert!(a.check().is_ok());
        a.first_name = "x".repeat(101);
        assert!(a.check().is_err());
        a.first_name = String::new();
        assert!(a.check().is_err());
    }
}
