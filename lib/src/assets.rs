//! Mirrors static files and book covers into the output tree.
//!
//! A file is copied only when its source is strictly newer than the copy
//! (or the copy is missing). Copies keep their source's modification time,
//! so an untouched source is never copied twice. Copies whose source went
//! away are removed.

use std::fs;
use std::path::Path;

use filetime::FileTime;
use rustc_hash::FxHashSet;

use crate::content::{Book, Index, COVER_DIR};
use crate::error::{Chainable, Result};
use crate::report::Report;
use crate::util::{mtime, remove_output};
use crate::walk::files;

/// Copies `src` to `dst` unless `dst` is at least as new. Returns `true` if
/// a copy was made.
pub fn copy_if_newer(src: &Path, dst: &Path) -> Result<bool> {
    let source_mtime = mtime(src)?;
    if dst.is_file() && mtime(dst)? >= source_mtime {
        return Ok(false);
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).chain_with(|| error! {
            "failed to create asset directory",
            "path" => parent.display(),
        })?;
    }

    fs::copy(src, dst).chain_with(|| error! {
        "failed to copy asset",
        "from" => src.display(),
        "to" => dst.display(),
    })?;

    let metadata = fs::metadata(src).chain_with(|| error! {
        "failed to read asset metadata",
        "path" => src.display(),
    })?;

    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(dst, modified).chain_with(|| error! {
        "failed to preserve asset modification time",
        "path" => dst.display(),
    })?;

    Ok(true)
}

/// Mirrors the directory `src` at `dst`. Files under `dst` with no
/// counterpart under `src` are removed; a missing `src` empties `dst`.
pub fn sync_dir(src: &Path, dst: &Path, output: &Path, report: &mut Report) -> Result<()> {
    let sources = files(src)?;
    let mut keep = FxHashSet::default();
    for source in &sources {
        let target = dst.join(&source.rel);
        if copy_if_newer(&source.path, &target)? {
            report.built(&target);
        }

        keep.insert(source.key());
    }

    for stale in files(dst)? {
        if !keep.contains(stale.key().as_str()) && remove_output(&stale.path, output)? {
            report.removed(&stale.path);
        }
    }

    Ok(())
}

/// Mirrors the single file `src` at `dst`, removing `dst` if `src` is gone.
pub fn sync_file(src: &Path, dst: &Path, output: &Path, report: &mut Report) -> Result<()> {
    if src.is_file() {
        if copy_if_newer(src, dst)? {
            report.built(dst);
        }
    } else if remove_output(dst, output)? {
        report.removed(dst);
    }

    Ok(())
}

/// Syncs each static item, a file or directory, to `output/<item name>`.
pub fn sync_static(items: &[impl AsRef<Path>], output: &Path, report: &mut Report) -> Result<()> {
    for item in items {
        let item = item.as_ref();
        let Some(name) = item.file_name() else {
            return err!("static item has no file name", "item" => item.display());
        };

        let dst = output.join(name);
        if item.is_dir() || (!item.exists() && dst.is_dir()) {
            sync_dir(item, &dst, output, report)?;
        } else {
            sync_file(item, &dst, output, report)?;
        }
    }

    Ok(())
}

/// Copies every book's cover under `output/books/covers` and removes covers
/// that no longer belong to a book.
pub fn sync_covers(books: &Index<Book>, output: &Path, report: &mut Report) -> Result<()> {
    let mut keep = FxHashSet::default();
    for cover in books.iter().filter_map(|book| book.cover.as_ref()) {
        let target = output.join(cover.output_rel());
        if copy_if_newer(&cover.source, &target)? {
            report.built(&target);
        }

        keep.insert(cover.rel.as_str());
    }

    for stale in files(&output.join(COVER_DIR))? {
        if !keep.contains(stale.key().as_str()) && remove_output(&stale.path, output)? {
            report.removed(&stale.path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn at(secs: u64) -> FileTime {
        FileTime::from_system_time(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn touch(path: &Path, contents: &str, secs: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        filetime::set_file_mtime(path, at(secs)).unwrap();
    }

    #[test]
    fn copies_only_when_newer() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.css");
        let dst = dir.path().join("out/a.css");
        touch(&src, "one", 1_000);

        assert!(copy_if_newer(&src, &dst).unwrap());
        assert_eq!(mtime(&dst).unwrap(), 1_000.0);
        assert!(!copy_if_newer(&src, &dst).unwrap());

        touch(&src, "two", 2_000);
        assert!(copy_if_newer(&src, &dst).unwrap());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "two");

        touch(&dst, "newer copy", 3_000);
        assert!(!copy_if_newer(&src, &dst).unwrap());
    }

    #[test]
    fn static_items_mirror_and_prune() {
        let site = tempfile::tempdir().unwrap();
        let output = site.path().join("build");
        let static_dir = site.path().join("static");
        let redirects = site.path().join("_redirects");
        touch(&static_dir.join("css/site.css"), "body {}", 1_000);
        touch(&static_dir.join("app.js"), "", 1_000);
        touch(&redirects, "/old /new", 1_000);

        let items = [static_dir.clone(), redirects.clone()];
        let mut report = Report::new(&output);
        sync_static(&items, &output, &mut report).unwrap();

        let mut paths = report.paths();
        paths.sort();
        assert_eq!(paths, ["_redirects", "static/app.js", "static/css/site.css"]);

        let mut report = Report::new(&output);
        sync_static(&items, &output, &mut report).unwrap();
        assert!(report.is_empty());

        fs::remove_dir_all(static_dir.join("css")).unwrap();
        fs::remove_file(&redirects).unwrap();
        let mut report = Report::new(&output);
        sync_static(&items, &output, &mut report).unwrap();

        let mut paths = report.paths();
        paths.sort();
        assert_eq!(paths, ["_redirects", "static/css/site.css"]);
        assert!(!output.join("static/css").exists());
        assert!(output.join("static/app.js").exists());
    }

    #[test]
    fn vanished_static_dir_is_emptied() {
        let site = tempfile::tempdir().unwrap();
        let output = site.path().join("build");
        let static_dir = site.path().join("static");
        touch(&static_dir.join("a.txt"), "a", 1_000);

        let items = [static_dir.clone()];
        sync_static(&items, &output, &mut Report::new(&output)).unwrap();
        fs::remove_dir_all(&static_dir).unwrap();

        let mut report = Report::new(&output);
        sync_static(&items, &output, &mut report).unwrap();
        assert_eq!(report.paths(), ["static/a.txt"]);
        assert!(!output.join("static").exists());
        assert!(output.exists());
    }

    #[test]
    fn covers_follow_their_books() {
        use crate::content::Content;
        use crate::walk::SourceFile;

        let site = tempfile::tempdir().unwrap();
        let books_root = site.path().join("books");
        let output = site.path().join("build");
        touch(&books_root.join("scifi/dune.md"), "---\ntitle: Dune\n---\n", 1_000);
        touch(&books_root.join("scifi/dune.png"), "png", 1_000);
        touch(&books_root.join("emma.md"), "", 1_000);

        let index = Index::<Book>::load(&books_root).unwrap();
        let mut report = Report::new(&output);
        sync_covers(&index, &output, &mut report).unwrap();
        assert_eq!(report.paths(), ["books/covers/scifi/dune.png"]);

        let stray = output.join("books/covers/gone.jpg");
        touch(&stray, "jpg", 1_000);
        fs::remove_file(books_root.join("scifi/dune.png")).unwrap();

        let dune = SourceFile::new(&books_root, books_root.join("scifi/dune.md")).unwrap();
        let index = Index::new(vec![Book::load(&books_root, dune).unwrap()]);
        let mut report = Report::new(&output);
        sync_covers(&index, &output, &mut report).unwrap();

        let mut paths = report.paths();
        paths.sort();
        assert_eq!(paths, ["books/covers/gone.jpg", "books/covers/scifi/dune.png"]);
        assert!(!output.join("books").exists());
    }
}
