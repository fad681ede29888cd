mod path_ext;

pub use path_ext::*;

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::error::{Chainable, Result};

/// Convert spaces to hyphens. Remove characters that aren't alphanumerics,
/// underscores, or hyphens. Convert to lowercase. Also strip leading and
/// trailing whitespace.
pub fn slugify(string: &str) -> String {
    let mut output = String::with_capacity(string.len());

    let mut need_dash = false;
    for ch in string.chars() {
        if ch.is_whitespace() || ch.is_control() {
            need_dash = !output.is_empty();
            continue;
        }

        for b in deunicode::deunicode_char(ch).unwrap_or("-").bytes() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => {
                    if need_dash {
                        output.push('-');
                        need_dash = false;
                    }

                    output.push(b.to_ascii_lowercase() as char);
                }
                _ => need_dash = !output.is_empty(),
            }
        }
    }

    output
}

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn collapse_whitespace(string: &str) -> String {
    string.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Modification time of `path` in fractional seconds since the epoch.
pub fn mtime<P: AsRef<Path>>(path: P) -> Result<f64> {
    let path = path.as_ref();
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .chain_with(|| error! {
            "failed to read modification time",
            "path" => path.display(),
        })?;

    Ok(modified.duration_since(UNIX_EPOCH).map_or(0.0, |d| d.as_secs_f64()))
}

/// Like [`mtime()`], but a missing file has time `0`.
pub fn mtime_or_zero<P: AsRef<Path>>(path: P) -> Result<f64> {
    match path.as_ref().exists() {
        true => mtime(path),
        false => Ok(0.0),
    }
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_output<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).chain_with(|| error! {
            "failed to create output directory",
            "path" => parent.display(),
        })?;
    }

    fs::write(path, contents).chain_with(|| error! {
        "failed to write output file",
        "path" => path.display(),
    })
}

/// Removes `start` and each of its ancestors while they are empty, stopping
/// at (and never removing) `stop` or the first non-empty directory.
pub fn cleanup_empty_dirs(start: &Path, stop: &Path) {
    let mut current = start;
    while current != stop && current.starts_with(stop) && current.is_dir() {
        if fs::remove_dir(current).is_err() {
            break;
        }

        tracing::debug!(dir = %current.display(), "removed empty directory");
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
}

/// Removes the file at `path` if it exists, then prunes empty parents up to
/// `stop`. Returns `true` if a file was removed.
pub fn remove_output(path: &Path, stop: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }

    fs::remove_file(path).chain_with(|| error! {
        "failed to remove stale output",
        "path" => path.display(),
    })?;

    if let Some(parent) = path.parent() {
        cleanup_empty_dirs(parent, stop);
    }

    Ok(true)
}
