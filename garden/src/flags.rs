use std::path::PathBuf;

use commonplace::error::Result;
use commonplace::Mode;

xflags::xflags! {
    /// Builds the site: notes, recipes, books, and static assets. Without a
    /// mode flag, rebuilds only what changed.
    cmd garden {
        /// Site root holding `garden.toml` (default: the current directory).
        optional --root dir: PathBuf
        /// Rebuild every page.
        optional --all
        /// Rebuild one note or recipe, relative to the site root.
        optional --item path: PathBuf
        /// Rebuild the landing page and the recipe and book listings.
        optional --index
        /// Only sync static files and book covers.
        optional --assets
        /// Delete the output directory.
        optional --clean
        /// Print changed output paths as a JSON array.
        optional --json
        /// Keep the build cache for the next incremental build.
        optional --keep-cache
    }
}

impl Garden {
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// The build mode the flags select. `--clean` is handled separately.
    pub fn mode(&self) -> Result<Mode> {
        let mut modes = vec![];
        if self.all {
            modes.push(Mode::Full);
        }

        if let Some(item) = &self.item {
            modes.push(Mode::Single(item.clone()));
        }

        if self.index {
            modes.push(Mode::Index);
        }

        if self.assets {
            modes.push(Mode::Assets);
        }

        match modes.len() {
            0 => Ok(Mode::Incremental),
            1 => Ok(modes.remove(0)),
            _ => commonplace::err!("conflicting build modes", "use at most one of --all, --item, --index, --assets"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> Garden {
        Garden {
            root: None,
            all: false,
            item: None,
            index: false,
            assets: false,
            clean: false,
            json: false,
            keep_cache: false,
        }
    }

    #[test]
    fn selects_modes() {
        assert_eq!(flags().mode().unwrap(), Mode::Incremental);
        assert_eq!(Garden { all: true, ..flags() }.mode().unwrap(), Mode::Full);
        assert_eq!(Garden { index: true, ..flags() }.mode().unwrap(), Mode::Index);
        assert_eq!(Garden { assets: true, ..flags() }.mode().unwrap(), Mode::Assets);

        let single = Garden { item: Some("notes/a.md".into()), ..flags() };
        assert_eq!(single.mode().unwrap(), Mode::Single("notes/a.md".into()));
    }

    #[test]
    fn rejects_conflicting_modes() {
        let error = Garden { all: true, assets: true, ..flags() }.mode().unwrap_err();
        assert_eq!(error.message(), "conflicting build modes");
    }

    #[test]
    fn parses_arguments() {
        let flags = Garden::from_vec(vec![
            "--root".into(),
            "site".into(),
            "--item".into(),
            "notes/a.md".into(),
            "--json".into(),
            "--keep-cache".into(),
        ]).unwrap();

        assert_eq!(flags.root(), PathBuf::from("site"));
        assert!(flags.json && flags.keep_cache);
        assert_eq!(flags.mode().unwrap(), Mode::Single("notes/a.md".into()));
        assert_eq!(Garden::from_vec(vec![]).unwrap().root(), PathBuf::from("."));
    }
}
