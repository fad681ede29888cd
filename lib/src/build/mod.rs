//! The incremental build.
//!
//! Every run reloads all content, prunes outputs of content that went away,
//! and then rebuilds what the chosen [`Mode`] asks for. In the default
//! [`Mode::Incremental`] an item is rebuilt only when it is stale:
//!
//! * it has no cache entry, or its recorded output is missing;
//! * its source is newer than the cached modification time;
//! * for recipes, a referenced recipe's metadata hash changed.
//!
//! Listing pages compare metadata hashes and key sets instead of times. When
//! the shared inputs (templates, navigation, wikilink targets) changed since
//! the last recorded build, any mode becomes a full rebuild.

mod pages;

pub use pages::{sections, BookCard, Pages, Section};
pub use pages::{BASE_TEMPLATE, BOOKS_TEMPLATE, RECIPES_TEMPLATE, RECIPE_TEMPLATE};

use std::fs;
use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::assets::{sync_covers, sync_static};
use crate::cache::{BuildCache, CacheEntry, RefHash, SharedInputs};
use crate::content::{Book, Content, ContentKind, Index, Note, Recipe};
use crate::error::{Chainable, Result};
use crate::layout::Layout;
use crate::markdown::WikiLinkMap;
use crate::nav::Nav;
use crate::report::Report;
use crate::templating::templates_mtime;
use crate::util::{mtime, mtime_or_zero, remove_output, write_output, PathExt};

/// What a build run rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Stale items and listings only.
    Incremental,
    /// Everything.
    Full,
    /// One note or recipe, plus stale listings. Relative paths are relative
    /// to the site root.
    Single(PathBuf),
    /// The landing page and the recipe and book listings.
    Index,
    /// Static files and covers only.
    Assets,
}

/// All content of a site, loaded fresh, with what is derived from it.
#[derive(Debug)]
pub struct Site {
    pub notes: Index<Note>,
    pub recipes: Index<Recipe>,
    pub books: Index<Book>,
    pub nav: Nav,
    pub links: WikiLinkMap,
}

impl Site {
    pub fn load(layout: &Layout) -> Result<Site> {
        let notes = Index::<Note>::load(&layout.notes)?;
        let recipes = Index::<Recipe>::load(&layout.recipes)?;
        let books = Index::<Book>::load(&layout.books)?;
        tracing::debug!(notes = notes.len(), recipes = recipes.len(), books = books.len(), "loaded content");

        Ok(Site {
            nav: Nav::build(&notes),
            links: WikiLinkMap::build(&notes),
            notes,
            recipes,
            books,
        })
    }

    pub fn shared_inputs(&self, layout: &Layout) -> Result<SharedInputs> {
        Ok(SharedInputs {
            templates_mtime: templates_mtime(&layout.templates)?,
            nav_hash: self.nav.hash.clone(),
            wikilinks_hash: self.links.hash(),
        })
    }

    /// The current metadata hash of each recipe `recipe` refers to. A missing
    /// target hashes as empty.
    pub fn ref_hashes(&self, recipe: &Recipe) -> Vec<RefHash> {
        recipe.parsed.ref_paths()
            .into_iter()
            .map(|path| RefHash {
                path: path.to_string(),
                metadata_hash: self.recipes.get(path)
                    .map(|r| r.metadata_hash.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Deletes the output tree. Returns `true` if there was one.
pub fn clean(layout: &Layout) -> Result<bool> {
    if !layout.output.exists() {
        return Ok(false);
    }

    fs::remove_dir_all(&layout.output).chain_with(|| error! {
        "failed to remove output directory",
        "path" => layout.output.display(),
    })?;

    Ok(true)
}

/// Runs one build. The cache is saved afterwards if `keep_cache`, and
/// deleted otherwise.
pub fn build(layout: &Layout, mode: Mode, keep_cache: bool) -> Result<Report> {
    let mode = match mode {
        Mode::Single(path) => Mode::Single(resolve_target(layout, &path)?),
        mode => mode,
    };

    let site = Site::load(layout)?;
    let mut builder = Builder {
        layout,
        site: &site,
        pages: Pages::new(layout, &site),
        cache: BuildCache::load(&layout.cache_file),
        report: Report::new(&layout.output),
    };

    let pruned = Pruned {
        notes: builder.prune(ContentKind::Notes, site.notes.keys())?,
        recipes: builder.prune(ContentKind::Recipes, site.recipes.keys())?,
        books: builder.prune(ContentKind::Books, site.books.keys())?,
    };

    let shared = site.shared_inputs(layout)?;
    let mode = match builder.cache.shared_inputs_changed(&shared) {
        true if mode != Mode::Full => {
            tracing::info!(requested = ?mode, "shared inputs changed; rebuilding everything");
            Mode::Full
        }
        _ => mode,
    };

    match mode {
        Mode::Full => builder.full()?,
        Mode::Index => builder.listings()?,
        Mode::Assets => builder.pruned_listings(pruned)?,
        Mode::Incremental => builder.incremental(pruned)?,
        Mode::Single(target) => builder.single(&target, pruned)?,
    }

    builder.sync_assets()?;
    builder.cache.record_shared_inputs(&shared);
    match keep_cache {
        true => builder.cache.save(&layout.cache_file)?,
        false => BuildCache::discard(&layout.cache_file)?,
    }

    Ok(builder.report)
}

fn resolve_target(layout: &Layout, path: &Path) -> Result<PathBuf> {
    let path = match path.is_absolute() {
        true => path.to_path_buf(),
        false => layout.root.join(path),
    };

    if !path.exists() {
        return err!("build target not found", "path" => path.display());
    }

    Ok(path)
}

/// Which content kinds lost entries while pruning.
#[derive(Debug, Clone, Copy, Default)]
struct Pruned {
    notes: bool,
    recipes: bool,
    books: bool,
}

/// Listing pages found stale before any item was rebuilt.
#[derive(Debug, Clone, Copy)]
struct StaleListings {
    landing: bool,
    recipes: bool,
    books: bool,
}

struct Builder<'a> {
    layout: &'a Layout,
    site: &'a Site,
    pages: Pages<'a>,
    cache: BuildCache,
    report: Report,
}

impl Builder<'_> {
    fn full(&mut self) -> Result<()> {
        let site = self.site;
        for note in &site.notes {
            self.build_note(note)?;
        }

        for recipe in &site.recipes {
            self.build_recipe(recipe)?;
        }

        self.listings()
    }

    fn listings(&mut self) -> Result<()> {
        self.build_landing()?;
        self.build_recipes_index()?;
        self.build_books_index()
    }

    fn incremental(&mut self, pruned: Pruned) -> Result<()> {
        let stale = self.stale_listings(pruned)?;
        let site = self.site;
        for note in &site.notes {
            if let Some(reason) = self.note_staleness(note)? {
                tracing::debug!(key = %note.key(), reason, "rebuilding note");
                self.build_note(note)?;
            }
        }

        for recipe in &site.recipes {
            if let Some(reason) = self.recipe_staleness(recipe)? {
                tracing::debug!(key = %recipe.key(), reason, "rebuilding recipe");
                self.build_recipe(recipe)?;
            }
        }

        self.build_stale_listings(stale)
    }

    fn single(&mut self, target: &Path, pruned: Pruned) -> Result<()> {
        let stale = self.stale_listings(pruned)?;
        let site = self.site;
        let key = |root: &Path, ext: &str| {
            let rel = target.normalize();
            let rel = rel.strip_prefix(root.normalize()).ok()?;
            (rel.extension()? == ext).then(|| rel.to_posix())
        };

        let note = key(&self.layout.notes, Note::EXTENSION).and_then(|k| site.notes.get(&k));
        let recipe = key(&self.layout.recipes, Recipe::EXTENSION).and_then(|k| site.recipes.get(&k));
        match (note, recipe) {
            (Some(note), _) => self.build_note(note)?,
            (None, Some(recipe)) => self.build_recipe(recipe)?,
            (None, None) => {
                tracing::debug!(target = %target.display(), "target is not a published page");
                self.report.skipped(target);
            }
        }

        self.build_stale_listings(stale)
    }

    /// Rebuilds the listings that lost members while pruning. The cache no
    /// longer remembers those members, so no later build would notice.
    fn pruned_listings(&mut self, pruned: Pruned) -> Result<()> {
        self.build_stale_listings(StaleListings {
            landing: pruned.notes,
            recipes: pruned.recipes,
            books: pruned.books,
        })
    }

    fn sync_assets(&mut self) -> Result<()> {
        sync_static(&self.layout.static_items, &self.layout.output, &mut self.report)?;
        sync_covers(&self.site.books, &self.layout.output, &mut self.report)
    }

    /// Removes the cache entries of `kind` that are not in `current`, and
    /// their outputs. Returns `true` if anything was pruned.
    fn prune(&mut self, kind: ContentKind, current: FxHashSet<&str>) -> Result<bool> {
        let gone = self.cache.keys(kind)
            .filter(|key| !current.contains(key))
            .map(String::from)
            .collect::<Vec<_>>();

        for key in &gone {
            let output = self.cache.remove(kind, key).and_then(|entry| entry.output);
            if let Some(path) = output.as_deref().and_then(|rel| self.output_path(rel)) {
                if remove_output(&path, &self.layout.output)? {
                    self.report.removed(&path);
                }
            }

            tracing::info!(%kind, %key, "pruned cache entry");
        }

        Ok(!gone.is_empty())
    }

    /// The absolute path of a cached output, if it stays inside the output
    /// tree.
    fn output_path(&self, rel: &str) -> Option<PathBuf> {
        let rel = Path::new(rel);
        let contained = rel.components().all(|c| matches!(c, Component::Normal(_)));
        match contained && !rel.as_os_str().is_empty() {
            true => Some(self.layout.output.join(rel)),
            false => {
                tracing::warn!(output = %rel.display(), "ignoring cached output outside the output tree");
                None
            }
        }
    }

    /// Why an item with `entry` and a source modified at `source_mtime`
    /// must be rebuilt, if it must.
    fn staleness(&self, entry: Option<&CacheEntry>, source_mtime: f64) -> Option<&'static str> {
        let Some(entry) = entry else {
            return Some("never built");
        };

        let output = entry.output.as_deref().and_then(|rel| self.output_path(rel));
        if !output.map_or(false, |path| path.is_file()) {
            return Some("output missing");
        }

        if source_mtime > entry.mtime {
            return Some("source modified");
        }

        None
    }

    fn note_staleness(&self, note: &Note) -> Result<Option<&'static str>> {
        let entry = self.cache.get(ContentKind::Notes, &note.key());
        Ok(self.staleness(entry, mtime(&note.source.path)?))
    }

    fn recipe_staleness(&self, recipe: &Recipe) -> Result<Option<&'static str>> {
        let entry = self.cache.get(ContentKind::Recipes, &recipe.key());
        if let Some(reason) = self.staleness(entry, mtime(&recipe.source.path)?) {
            return Ok(Some(reason));
        }

        let cached = entry.and_then(|e| e.ref_hashes.as_deref()).unwrap_or_default();
        match cached != self.site.ref_hashes(recipe).as_slice() {
            true => Ok(Some("referenced recipe changed")),
            false => Ok(None),
        }
    }

    /// Whether the cached entries of `kind` differ from `items` in key set
    /// or in any metadata hash.
    fn members_changed<T: Content>(&self, kind: ContentKind, items: &Index<T>) -> bool {
        let cached = self.cache.entries(kind);
        cached.len() != items.len() || items.iter().any(|item| {
            cached.get(&item.key()).map_or(true, |e| e.metadata_hash != item.metadata_hash())
        })
    }

    fn stale_listings(&self, pruned: Pruned) -> Result<StaleListings> {
        let output = &self.layout.output;
        let missing = |rel: &str| !output.join(rel).is_file();
        let notes_changed = self.site.notes.iter().any(|note| {
            self.cache.get(ContentKind::Notes, &note.key())
                .map_or(true, |e| e.metadata_hash != note.metadata_hash)
        });

        let about_changed = mtime_or_zero(&self.layout.about)? != self.cache.about_md_mtime;
        let stale = StaleListings {
            landing: pruned.notes || notes_changed || about_changed || missing(LANDING),
            recipes: pruned.recipes
                || missing(RECIPES_INDEX)
                || self.members_changed(ContentKind::Recipes, &self.site.recipes),
            books: pruned.books
                || missing(BOOKS_INDEX)
                || self.members_changed(ContentKind::Books, &self.site.books),
        };

        tracing::debug!(?stale, "listing staleness");
        Ok(stale)
    }

    fn build_stale_listings(&mut self, stale: StaleListings) -> Result<()> {
        if stale.landing {
            self.build_landing()?;
        }

        if stale.recipes {
            self.build_recipes_index()?;
        }

        if stale.books {
            self.build_books_index()?;
        }

        Ok(())
    }

    fn write(&mut self, rel: &Path, html: &str) -> Result<()> {
        let path = self.layout.output.join(rel);
        write_output(&path, html)?;
        self.report.built(&path);
        Ok(())
    }

    fn build_note(&mut self, note: &Note) -> Result<()> {
        let html = self.pages.note(note)?;
        let rel = note.output_rel();
        self.write(&rel, &html)?;
        self.cache.set(ContentKind::Notes, note.key(), CacheEntry {
            mtime: mtime(&note.source.path)?,
            metadata_hash: note.metadata_hash.clone(),
            output: Some(rel.to_posix()),
            ref_hashes: None,
        });

        Ok(())
    }

    fn build_recipe(&mut self, recipe: &Recipe) -> Result<()> {
        let html = self.pages.recipe(recipe)?;
        let rel = recipe.output_rel();
        self.write(&rel, &html)?;
        self.cache.set(ContentKind::Recipes, recipe.key(), CacheEntry {
            mtime: mtime(&recipe.source.path)?,
            metadata_hash: recipe.metadata_hash.clone(),
            output: Some(rel.to_posix()),
            ref_hashes: Some(self.site.ref_hashes(recipe)),
        });

        Ok(())
    }

    fn build_landing(&mut self) -> Result<()> {
        let html = self.pages.landing()?;
        self.write(Path::new(LANDING), &html)?;
        self.cache.about_md_mtime = mtime_or_zero(&self.layout.about)?;
        Ok(())
    }

    fn build_recipes_index(&mut self) -> Result<()> {
        let html = self.pages.recipes_index()?;
        self.write(Path::new(RECIPES_INDEX), &html)
    }

    /// Books have no pages of their own, so their cache entries are written
    /// here, all at once.
    fn build_books_index(&mut self) -> Result<()> {
        let html = self.pages.books_index()?;
        self.write(Path::new(BOOKS_INDEX), &html)?;

        let mut entries = std::collections::BTreeMap::new();
        for book in &self.site.books {
            entries.insert(book.key(), CacheEntry {
                mtime: mtime(&book.source.path)?,
                metadata_hash: book.metadata_hash.clone(),
                output: None,
                ref_hashes: None,
            });
        }

        self.cache.replace(ContentKind::Books, entries);
        Ok(())
    }
}

const LANDING: &str = "index.html";
const RECIPES_INDEX: &str = "recipes/index.html";
const BOOKS_INDEX: &str = "books/index.html";
