use serde::Serialize;

use crate::content::{Index, Note};
use crate::hash::digest;

/// One sidebar entry.
///
/// Fields are declared in name order so that the serialized form, and with it
/// the fingerprint, is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Parent directories as breadcrumbs, or empty.
    pub parent_label: String,
    pub title: String,
    pub url: String,
}

/// The sidebar shared by every page, and its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nav {
    pub items: Vec<NavItem>,
    pub hash: String,
}

const FIXED: [(&str, &str); 2] = [("Books", "/books"), ("Recipes", "/recipes")];

impl Nav {
    /// Builds the sidebar from the public notes: fixed section entries plus
    /// one entry per note, ordered by lowercase title, then URL.
    pub fn build(notes: &Index<Note>) -> Nav {
        let mut items = FIXED.iter()
            .map(|&(title, url)| NavItem {
                parent_label: String::new(),
                title: title.into(),
                url: url.into(),
            })
            .chain(notes.iter().map(|note| NavItem {
                parent_label: note.parent_label(),
                title: note.title.clone(),
                url: note.url(),
            }))
            .collect::<Vec<_>>();

        items.sort_by_cached_key(|item| (item.title.to_lowercase(), item.url.clone()));

        // A `Vec` of plain structs always serializes.
        let payload = serde_json::to_string(&items).unwrap_or_default();
        Nav { hash: digest(&payload), items }
    }
}
