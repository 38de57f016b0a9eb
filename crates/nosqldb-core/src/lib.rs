//! # `nosqldb` Core
//!
//! Storage engine for a small append-only JSON document store: a raw data
//! file, a fixed-width index file, and a persistent attribute posting
//! index, wired through a dedicated dispatcher thread per collection so the
//! engine never needs an internal lock.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use nosqldb_core::Database;
//!
//! let db = Database::open("./data")?;
//! db.create_collection("people")?;
//! let people = db.get_collection("people").unwrap();
//!
//! let id = people.write(r#"{"name":"Jo","kind":"cat"}"#)?;
//! let found = people.read(r#"{"kind":"cat"}"#)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod error;
pub mod idgen;
pub mod json;
pub mod storage;

pub use collection::CollectionHandle;
pub use config::NosqlConfig;
pub use error::{Error, Result};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Registry of open collections, one dispatcher thread each, all rooted
/// under a single data-home directory (spec §4.6).
pub struct Database {
    data_home: PathBuf,
    collections: parking_lot::RwLock<HashMap<String, CollectionHandle>>,
}

impl Database {
    /// Opens the database rooted at `data_home`, creating the directory if
    /// absent and bootstrapping a dispatcher for every existing collection
    /// subdirectory found there.
    ///
    /// # Errors
    ///
    /// Returns an error if `data_home` cannot be created or an existing
    /// collection's files are corrupt.
    pub fn open<P: AsRef<Path>>(data_home: P) -> Result<Self> {
        let data_home = data_home.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_home)?;

        let mut collections = HashMap::new();
        for name in discover_collection_names(&data_home)? {
            let handle = open_collection(&data_home, &name)?;
            collections.insert(name, handle);
        }
        tracing::info!(
            data_home = %data_home.display(),
            collections = collections.len(),
            "database opened"
        );

        Ok(Self {
            data_home,
            collections: parking_lot::RwLock::new(collections),
        })
    }

    /// Creates a new collection named `name` and spawns its dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionExists`] if a collection with this name is
    /// already registered.
    pub fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(Error::CollectionExists(name.to_string()));
        }

        std::fs::create_dir_all(self.data_home.join(name))?;
        let handle = open_collection(&self.data_home, name)?;
        collections.insert(name.to_string(), handle);
        tracing::info!(collection = name, "collection created");
        Ok(())
    }

    /// Returns a cloneable handle to an already-open collection.
    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<CollectionHandle> {
        self.collections.read().get(name).cloned()
    }

    /// Names of every collection currently registered in this database.
    #[must_use]
    pub fn list_collections(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }
}

fn open_collection(data_home: &Path, name: &str) -> Result<CollectionHandle> {
    let dir = data_home.join(name);
    let engine = collection::Engine::open(
        &dir.join(format!("{name}.db")),
        &dir.join(format!("{name}.index")),
        &dir.join(format!("{name}.attr")),
    )?;
    Ok(CollectionHandle::spawn(name.to_string(), engine))
}

/// Enumerates the subdirectories of `data_home`, each one a collection
/// name (spec §4.6 `all()`).
fn discover_collection_names(data_home: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(data_home)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_on_empty_directory_has_no_collections() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(db.list_collections().is_empty());
    }

    #[test]
    fn create_then_get_collection() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        db.create_collection("people").unwrap();
        assert_eq!(db.list_collections(), vec!["people".to_string()]);
        let people = db.get_collection("people").unwrap();
        let id = people.write(r#"{"name":"Jo"}"#).unwrap();
        assert_eq!(people.read(&format!(r#"{{"id":"{id}"}}"#)).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_collection_name_errors() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        db.create_collection("people").unwrap();
        let err = db.create_collection("people").unwrap_err();
        assert_eq!(err.code(), "NOSQL-005");
    }

    #[test]
    fn reopening_the_database_recovers_existing_collections() {
        let dir = tempdir().unwrap();
        {
            let db = Database::open(dir.path()).unwrap();
            db.create_collection("people").unwrap();
            let people = db.get_collection("people").unwrap();
            people.write(r#"{"id":"a","kind":"cat"}"#).unwrap();
        }

        let reopened = Database::open(dir.path()).unwrap();
        assert_eq!(reopened.list_collections(), vec!["people".to_string()]);
        let people = reopened.get_collection("people").unwrap();
        assert_eq!(people.read(r#"{"id":"a"}"#).unwrap().len(), 1);
        assert_eq!(people.read(r#"{"kind":"cat"}"#).unwrap().len(), 1);
    }

    #[test]
    fn unknown_collection_is_absent() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        assert!(db.get_collection("ghost").is_none());
    }
}
