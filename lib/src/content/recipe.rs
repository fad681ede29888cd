use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::frontmatter;
use crate::hash::metadata_hash;
use crate::recipe::{parse_in, ParsedRecipe, RecipeLookup, RefScope};
use crate::util::PathExt;
use crate::walk::SourceFile;
use super::{read_source, Content, Index};

#[derive(Debug, Clone)]
pub struct Recipe {
    pub source: SourceFile,
    /// Root-relative path without its extension, `/`-separated.
    pub slug: String,
    pub title: String,
    /// The `serves` or `servings` field, verbatim.
    pub servings: String,
    pub parsed: ParsedRecipe,
    pub metadata_hash: String,
}

impl Recipe {
    pub fn url(&self) -> String {
        format!("/recipes/{}", self.slug)
    }

    pub fn output_rel(&self) -> PathBuf {
        Path::new("recipes").join(&self.slug).join("index.html")
    }
}

impl Content for Recipe {
    const EXTENSION: &'static str = "cook";

    fn load(root: &Path, source: SourceFile) -> Result<Self> {
        let raw = read_source(&source.path)?;
        let (meta, body) = frontmatter::split(&raw);
        let title = match meta.field("title") {
            "" => source.file_stem().to_string(),
            title => title.to_string(),
        };

        let dir = source.path.parent().unwrap_or(root);
        let parsed = parse_in(body, Some(RefScope { root, dir }));

        Ok(Recipe {
            slug: source.rel.without_extension().to_posix(),
            servings: meta.first_of(&["serves", "servings"]).to_string(),
            metadata_hash: metadata_hash([title.as_str()]),
            title,
            parsed,
            source,
        })
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }

    fn metadata_hash(&self) -> &str {
        &self.metadata_hash
    }
}

impl RecipeLookup for Index<Recipe> {
    fn title(&self, key: &str) -> Option<&str> {
        self.get(key).map(|r| r.title.as_str())
    }

    fn url(&self, key: &str) -> Option<String> {
        self.get(key).map(|r| r.url())
    }
}
