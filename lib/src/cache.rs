//! The persisted build cache.
//!
//! One JSON document records, per content item, what its last build saw:
//!
//! ```json
//! {
//!   "templates_mtime": 1700000000.5,
//!   "nav_hash": "…",
//!   "wikilinks_hash": "…",
//!   "notes": { "dir/note.md": { "mtime": 1.0, "metadata_hash": "…", "output": "dir/note/index.html" } },
//!   "recipes": { "soup.cook": { "mtime": 1.0, "metadata_hash": "…", "output": "…", "ref_hashes": [] } },
//!   "books": { "dune.md": { "mtime": 1.0, "metadata_hash": "…" } },
//!   "about_md_mtime": 1.0
//! }
//! ```
//!
//! Loading never fails: a missing, unreadable, or corrupt document is an
//! empty cache, and malformed entries are dropped. Both force rebuilds.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::ContentKind;
use crate::error::{Chainable, Result};
use crate::util::write_output;

/// The metadata hash of a referenced recipe as of the referrer's last build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefHash {
    pub path: String,
    pub metadata_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Source modification time, seconds since the epoch.
    #[serde(default)]
    pub mtime: f64,
    #[serde(default)]
    pub metadata_hash: String,
    /// Output path relative to the output root. Books have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_hashes: Option<Vec<RefHash>>,
}

/// Inputs every page depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedInputs {
    /// Latest template modification time.
    pub templates_mtime: f64,
    pub nav_hash: String,
    pub wikilinks_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildCache {
    pub templates_mtime: f64,
    pub nav_hash: String,
    pub wikilinks_hash: String,
    notes: BTreeMap<String, CacheEntry>,
    recipes: BTreeMap<String, CacheEntry>,
    books: BTreeMap<String, CacheEntry>,
    pub about_md_mtime: f64,
}

impl BuildCache {
    /// Loads the cache at `path`, falling back to an empty cache.
    pub fn load(path: &Path) -> BuildCache {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BuildCache::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable build cache; starting fresh");
                return BuildCache::default();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => BuildCache::from_value(&value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt build cache; starting fresh");
                BuildCache::default()
            }
        }
    }

    /// Reads whatever is well-formed out of `value`.
    pub fn from_value(value: &Value) -> BuildCache {
        let Some(object) = value.as_object() else {
            tracing::warn!("build cache is not a JSON object; starting fresh");
            return BuildCache::default();
        };

        let number = |key: &str| object.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let string = |key: &str| object.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut cache = BuildCache {
            templates_mtime: number("templates_mtime"),
            nav_hash: string("nav_hash"),
            wikilinks_hash: string("wikilinks_hash"),
            about_md_mtime: number("about_md_mtime"),
            ..BuildCache::default()
        };

        for kind in ContentKind::ALL {
            let Some(entries) = object.get(kind.as_str()).and_then(Value::as_object) else {
                continue;
            };

            for (key, entry) in entries {
                match CacheEntry::deserialize(entry) {
                    Ok(entry) => cache.set(kind, key.clone(), entry),
                    Err(e) => tracing::warn!(%kind, %key, error = %e, "dropping malformed cache entry"),
                }
            }
        }

        cache
    }

    /// Writes the cache to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .chain_with(|| error!("failed to serialize build cache"))?;

        write_output(path, &json)
    }

    /// Removes a cache file left at `path`, if any.
    pub fn discard(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e).chain_with(|| error! {
                "failed to remove build cache",
                "path" => path.display(),
            }),
            _ => Ok(()),
        }
    }

    pub fn entries(&self, kind: ContentKind) -> &BTreeMap<String, CacheEntry> {
        match kind {
            ContentKind::Notes => &self.notes,
            ContentKind::Recipes => &self.recipes,
            ContentKind::Books => &self.books,
        }
    }

    fn entries_mut(&mut self, kind: ContentKind) -> &mut BTreeMap<String, CacheEntry> {
        match kind {
            ContentKind::Notes => &mut self.notes,
            ContentKind::Recipes => &mut self.recipes,
            ContentKind::Books => &mut self.books,
        }
    }

    pub fn get(&self, kind: ContentKind, key: &str) -> Option<&CacheEntry> {
        self.entries(kind).get(key)
    }

    pub fn set(&mut self, kind: ContentKind, key: impl Into<String>, entry: CacheEntry) {
        self.entries_mut(kind).insert(key.into(), entry);
    }

    pub fn remove(&mut self, kind: ContentKind, key: &str) -> Option<CacheEntry> {
        self.entries_mut(kind).remove(key)
    }

    /// Replaces every entry of `kind`.
    pub fn replace(&mut self, kind: ContentKind, entries: BTreeMap<String, CacheEntry>) {
        *self.entries_mut(kind) = entries;
    }

    pub fn keys(&self, kind: ContentKind) -> impl Iterator<Item = &str> {
        self.entries(kind).keys().map(|k| k.as_str())
    }

    /// Whether `current` differs from the shared inputs of the last build.
    /// Templates count as changed only when they got newer.
    pub fn shared_inputs_changed(&self, current: &SharedInputs) -> bool {
        current.templates_mtime > self.templates_mtime
            || current.nav_hash != self.nav_hash
            || current.wikilinks_hash != self.wikilinks_hash
    }

    pub fn record_shared_inputs(&mut self, current: &SharedInputs) {
        self.templates_mtime = current.templates_mtime;
        self.nav_hash = current.nav_hash.clone();
        self.wikilinks_hash = current.wikilinks_hash.clone();
    }
}
