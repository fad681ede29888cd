use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::util::PathExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Built,
    Removed,
    Skipped,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Built => "Built".fmt(f),
            Action::Removed => "Removed".fmt(f),
            Action::Skipped => "Skipped".fmt(f),
        }
    }
}

/// One file a build touched (or declined to touch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub action: Action,
    /// `/`-separated; relative to the output root for outputs.
    pub path: String,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.path)
    }
}

/// Everything a build run wrote, removed, or skipped, in order.
#[derive(Debug, Clone)]
pub struct Report {
    output: PathBuf,
    changes: Vec<Change>,
}

impl Report {
    pub fn new(output: &Path) -> Self {
        Report { output: output.to_path_buf(), changes: vec![] }
    }

    fn push(&mut self, action: Action, path: &Path) {
        let path = match path.strip_prefix(&self.output) {
            Ok(rel) => rel.to_posix(),
            Err(_) => path.to_string_lossy().into_owned(),
        };

        self.changes.push(Change { action, path });
    }

    pub fn built(&mut self, path: &Path) {
        tracing::info!(path = %path.display(), "wrote output");
        self.push(Action::Built, path);
    }

    pub fn removed(&mut self, path: &Path) {
        tracing::info!(path = %path.display(), "removed output");
        self.push(Action::Removed, path);
    }

    pub fn skipped(&mut self, source: &Path) {
        self.changes.push(Change {
            action: Action::Skipped,
            path: source.to_string_lossy().into_owned(),
        });
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Output paths that were written or removed.
    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter()
            .filter(|c| c.action != Action::Skipped)
            .map(|c| c.path.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
