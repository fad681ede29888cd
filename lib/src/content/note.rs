use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::frontmatter;
use crate::hash::metadata_hash;
use crate::util::PathExt;
use crate::walk::SourceFile;
use super::{read_source, Content};

#[derive(Debug, Clone)]
pub struct Note {
    pub source: SourceFile,
    /// The `title` front matter field, or empty.
    pub declared_title: String,
    /// The declared title, falling back to the file stem.
    pub title: String,
    pub public: bool,
    pub body: String,
    pub metadata_hash: String,
}

impl Note {
    /// Loads the note at `path`, which must be beneath `root`.
    pub fn read(root: &Path, path: &Path) -> Result<Note> {
        Note::load(root, SourceFile::new(root, path.to_path_buf())?)
    }

    /// `dir/note.md` is served at `/dir/note`.
    pub fn url(&self) -> String {
        format!("/{}", self.source.rel.without_extension().to_posix())
    }

    /// `dir/note.md` renders to `dir/note/index.html`.
    pub fn output_rel(&self) -> PathBuf {
        self.source.rel.without_extension().join("index.html")
    }

    /// The parent directory as breadcrumbs: `a/b/note.md` is `a / b`.
    pub fn parent_label(&self) -> String {
        self.source.rel.parent()
            .map(|p| p.to_posix().replace('/', " / "))
            .unwrap_or_default()
    }
}

impl Content for Note {
    const EXTENSION: &'static str = "md";

    fn load(_: &Path, source: SourceFile) -> Result<Self> {
        let raw = read_source(&source.path)?;
        let (meta, body) = frontmatter::split(&raw);
        let declared_title = meta.field("title").to_string();
        let title = match declared_title.is_empty() {
            true => source.file_stem().to_string(),
            false => declared_title.clone(),
        };

        Ok(Note {
            public: meta.field("public").eq_ignore_ascii_case("true"),
            metadata_hash: metadata_hash([declared_title.as_str()]),
            body: body.to_string(),
            declared_title,
            title,
            source,
        })
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }

    fn metadata_hash(&self) -> &str {
        &self.metadata_hash
    }

    fn is_published(&self) -> bool {
        self.public
    }
}
