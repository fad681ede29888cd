use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Chainable, Result};

/// Where a site's sources live and where its output goes. All paths are
/// absolute or relative to the process, never to each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub notes: PathBuf,
    pub recipes: PathBuf,
    pub books: PathBuf,
    pub templates: PathBuf,
    pub output: PathBuf,
    /// The landing page's markdown source.
    pub about: PathBuf,
    /// Files or directories mirrored into `output` under their own name.
    pub static_items: Vec<PathBuf>,
    pub cache_file: PathBuf,
}

/// `garden.toml`, as written. Relative paths are relative to the site root.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    notes: Option<PathBuf>,
    recipes: Option<PathBuf>,
    books: Option<PathBuf>,
    templates: Option<PathBuf>,
    output: Option<PathBuf>,
    about: Option<PathBuf>,
    #[serde(rename = "static")]
    static_items: Option<Vec<PathBuf>>,
    /// Relative to `output`.
    cache_file: Option<PathBuf>,
}

pub const CONFIG_FILE: &str = "garden.toml";

pub const DEFAULT_CACHE_FILE: &str = ".build_cache.json";

impl Layout {
    /// The default layout for a site rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Layout {
        Layout::resolve(root.as_ref(), Config::default())
    }

    /// Parses a `garden.toml` document for the site rooted at `root`.
    pub fn from_toml<P: AsRef<Path>>(toml: &str, root: P) -> Result<Layout> {
        let config: Config = toml::from_str(toml)
            .chain_with(|| error!("invalid site configuration"))?;

        Ok(Layout::resolve(root.as_ref(), config))
    }

    /// Reads `garden.toml` under `root` if there is one, else the default.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Layout> {
        let root = root.as_ref();
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!(root = %root.display(), "no configuration file; using defaults");
            return Ok(Layout::new(root));
        }

        let toml = std::fs::read_to_string(&path)
            .chain_with(|| error!("failed to read site configuration", "path" => path.display()))?;

        Layout::from_toml(&toml, root)
            .chain_with(|| error!("failed to load site configuration", "path" => path.display()))
    }

    fn resolve(root: &Path, config: Config) -> Layout {
        let at = |path: Option<PathBuf>, default: &str| root.join(path.unwrap_or_else(|| default.into()));
        let notes = at(config.notes, "notes");
        let output = at(config.output, "build");
        let about = match config.about {
            Some(about) => root.join(about),
            None => notes.join("about.md"),
        };

        let static_items = config.static_items
            .unwrap_or_else(|| vec!["static".into()])
            .into_iter()
            .map(|item| root.join(item))
            .collect();

        Layout {
            recipes: at(config.recipes, "recipes"),
            books: at(config.books, "books"),
            templates: at(config.templates, "templates"),
            cache_file: output.join(config.cache_file.unwrap_or_else(|| DEFAULT_CACHE_FILE.into())),
            root: root.to_path_buf(),
            notes,
            output,
            about,
            static_items,
        }
    }
}
