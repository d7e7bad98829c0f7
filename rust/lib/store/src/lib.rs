//! Document collections over a key-value backend.
//!
//! A record type implements [`Document`] to declare its key prefix, how
//! its id is read and assigned, and its schema check. [`Collection`]
//! provides find/create/update/delete/populate on top of any
//! `locallib_kv::KVStore`.
//!
//! ```ignore
//! impl Document for Genre {
//!     fn kv_prefix() -> &'static str { "catalog:genre:" }
//!     fn key_value(&self) -> String { self.id.clone() }
//!     fn assign_key(&mut self, id: &str) { self.id = id.to_string(); }
//! }
//! ```

pub mod collection;

pub use collection::{Collection, Document};
