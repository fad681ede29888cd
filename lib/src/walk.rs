use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::error::{Chainable, Result};
use crate::util::PathExt;

/// A file discovered beneath a content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// Path relative to the content root it was found under.
    pub rel: PathBuf,
}

impl SourceFile {
    pub fn new(root: &Path, path: PathBuf) -> Result<Self> {
        let rel = path.strip_prefix(root)
            .chain_with(|| error! {
                "source file is not beneath its content root",
                "file" => path.display(),
                "root" => root.display(),
            })?
            .to_path_buf();

        Ok(SourceFile { path, rel })
    }

    /// The stable identity of the file across builds: its root-relative path
    /// with `/` separators.
    pub fn key(&self) -> String {
        self.rel.to_posix()
    }

    /// File name without the final extension.
    pub fn file_stem(&self) -> &str {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
    }
}

/// Recursively collects the files under `root` whose extension is `ext`.
/// Hidden files and directories are skipped. A missing root yields nothing.
///
/// Traversal order is unspecified; callers that present the result sort it.
pub fn files_with_ext(root: &Path, ext: &str) -> Result<Vec<SourceFile>> {
    files_matching(root, |path| path.extension() == Some(OsStr::new(ext)))
}

/// Like [`files_with_ext()`], but collects every file.
pub fn files(root: &Path) -> Result<Vec<SourceFile>> {
    files_matching(root, |_| true)
}

fn files_matching<F: FnMut(&Path) -> bool>(root: &Path, mut keep: F) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "content root missing; treating as empty");
        return Ok(vec![]);
    }

    let mut files = vec![];
    for entry in WalkDir::new(root).follow_links(true).skip_hidden(true) {
        let entry = entry.chain_with(|| error! {
            "failed to walk directory",
            "root" => root.display(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if keep(&path) {
            files.push(SourceFile::new(root, path)?);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn finds_nested_files_by_extension() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("a/b")).unwrap();
        fs::create_dir_all(root.path().join(".hidden")).unwrap();
        fs::write(root.path().join("top.md"), "").unwrap();
        fs::write(root.path().join("a/b/deep.md"), "").unwrap();
        fs::write(root.path().join("a/other.txt"), "").unwrap();
        fs::write(root.path().join(".hidden/secret.md"), "").unwrap();

        let mut keys = files_with_ext(root.path(), "md").unwrap()
            .iter()
            .map(|f| f.key())
            .collect::<Vec<_>>();

        keys.sort();
        assert_eq!(keys, ["a/b/deep.md", "top.md"]);
    }

    #[test]
    fn collects_every_file() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("css")).unwrap();
        fs::write(root.path().join("css/site.css"), "").unwrap();
        fs::write(root.path().join("favicon.ico"), "").unwrap();

        let mut keys = files(root.path()).unwrap().iter().map(|f| f.key()).collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, ["css/site.css", "favicon.ico"]);
    }

    #[test]
    fn missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(files_with_ext(&root.path().join("nope"), "md").unwrap().is_empty());
    }

    #[test]
    fn source_file_identity() {
        let file = SourceFile::new(Path::new("/notes"), "/notes/dir/My Note.md".into()).unwrap();
        assert_eq!(file.key(), "dir/My Note.md");
        assert_eq!(file.file_stem(), "My Note");
        assert!(SourceFile::new(Path::new("/notes"), "/elsewhere/x.md".into()).is_err());
    }
}
