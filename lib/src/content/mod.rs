//! Typed content records and the indexers that load them.
//!
//! Each content root is walked for files of one extension. Every file becomes
//! a record keyed by its root-relative path. Records are rebuilt from disk on
//! every run and never persisted.

mod note;
mod recipe;
mod book;

pub use note::Note;
pub use recipe::Recipe;
pub use book::{Book, Cover, Status, COVER_DIR};

use std::fmt;
use std::fs;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Chainable, Result};
use crate::walk::{files_with_ext, SourceFile};

/// The content types with cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Notes,
    Recipes,
    Books,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::Notes, ContentKind::Recipes, ContentKind::Books];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Notes => "notes",
            ContentKind::Recipes => "recipes",
            ContentKind::Books => "books",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What every indexed record exposes.
pub trait Content {
    const EXTENSION: &'static str;

    fn load(root: &Path, source: SourceFile) -> Result<Self> where Self: Sized;

    fn source(&self) -> &SourceFile;

    fn metadata_hash(&self) -> &str;

    /// Whether the record belongs on the site.
    fn is_published(&self) -> bool {
        true
    }

    fn key(&self) -> String {
        self.source().key()
    }
}

/// Published records in discovery order, plus a lookup by key.
#[derive(Debug, Clone)]
pub struct Index<T> {
    items: Vec<T>,
    by_key: FxHashMap<String, usize>,
}

impl<T: Content> Index<T> {
    pub fn new(items: Vec<T>) -> Self {
        let by_key = items.iter()
            .enumerate()
            .map(|(i, item)| (item.key(), i))
            .collect();

        Index { items, by_key }
    }

    /// Walks `root` and loads every published record under it.
    pub fn load(root: &Path) -> Result<Self> {
        let mut items = vec![];
        for source in files_with_ext(root, T::EXTENSION)? {
            let item = T::load(root, source)?;
            if item.is_published() {
                items.push(item);
            } else {
                tracing::debug!(key = %item.key(), "skipping unpublished item");
            }
        }

        Ok(Index::new(items))
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.by_key.get(key).map(|&i| &self.items[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn keys(&self) -> FxHashSet<&str> {
        self.by_key.keys().map(|k| k.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a Index<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Reads a content source, naming the file on failure.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).chain_with(|| error! {
        "failed to read content source",
        "path" => path.display(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn index_lookup_by_key() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("sub")).unwrap();
        fs::write(root.path().join("a.cook"), "---\ntitle: A\n---\n@x").unwrap();
        fs::write(root.path().join("sub/b.cook"), "@y").unwrap();

        let index = Index::<Recipe>::load(root.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains("sub/b.cook"));
        assert_eq!(index.get("a.cook").unwrap().title, "A");
        assert_eq!(index.get("sub/b.cook").unwrap().title, "b");
        assert!(index.get("missing.cook").is_none());

        let mut keys = index.keys().into_iter().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, ["a.cook", "sub/b.cook"]);
    }

    #[test]
    fn private_notes_are_not_indexed() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("public.md"), "---\npublic: TRUE\n---\nhi").unwrap();
        fs::write(root.path().join("private.md"), "---\npublic: yes\n---\nhi").unwrap();
        fs::write(root.path().join("bare.md"), "no front matter").unwrap();

        let index = Index::<Note>::load(root.path()).unwrap();
        let keys = index.iter().map(|n| n.key()).collect::<Vec<_>>();
        assert_eq!(keys, ["public.md"]);
    }

    #[test]
    fn missing_roots_are_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(Index::<Book>::load(&root.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn unreadable_sources_fail_the_index() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();

        let error = Index::<Note>::load(root.path()).unwrap_err();
        assert!(error.to_string().contains("bad.md"));
    }

    #[test]
    fn kinds_display() {
        assert_eq!(ContentKind::ALL.map(|k| k.to_string()), ["notes", "recipes", "books"]);
    }
}
