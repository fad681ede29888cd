//! Reading habit checklists out of a directory of daily notes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use commonplace::error::{Chainable, Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static DAILY_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})\.md$").expect("valid daily file pattern")
});

static CHECKLIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-\s*\[(?P<state>[ xX])\]").expect("valid checklist pattern")
});

/// Whether each habit tag was checked on one day.
pub type Day = BTreeMap<String, bool>;

/// The daily notes found in a vault, and the tag prefix habits are marked
/// with.
#[derive(Debug)]
pub struct Journal {
    days: BTreeMap<NaiveDate, PathBuf>,
    tag: Regex,
}

impl Journal {
    /// Indexes the daily files directly inside `vault`. Files whose name is
    /// not a valid `YYYY-MM-DD.md` date are ignored.
    pub fn open(vault: &Path, prefix: &str) -> Result<Self> {
        let pattern = format!(r"#{}/[A-Za-z0-9_/-]+", regex::escape(prefix));
        let tag = Regex::new(&pattern)
            .map_err(Error::from_std)
            .chain_with(|| commonplace::error!("invalid habit tag prefix", "prefix" => prefix))?;

        let entries = fs::read_dir(vault)
            .chain_with(|| commonplace::error!("failed to read vault", "path" => vault.display()))?;

        let mut days = BTreeMap::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            if let Some(date) = path.file_name().and_then(|n| n.to_str()).and_then(date_of) {
                days.insert(date, path);
            }
        }

        tracing::debug!(vault = %vault.display(), days = days.len(), "indexed daily notes");
        Ok(Journal { days, tag })
    }

    /// The habits recorded on `date`. A day without a file, or whose file
    /// can't be read, has none.
    pub fn day(&self, date: NaiveDate) -> Day {
        let Some(path) = self.days.get(&date) else {
            return Day::new();
        };

        match fs::read_to_string(path) {
            Ok(text) => self.habits(&text),
            Err(e) => {
                tracing::warn!(path = %path.display(), "unreadable daily note: {e}");
                Day::new()
            }
        }
    }

    /// Collects the tagged checklist items in `text`. A tag counts as
    /// checked if any of its items that day is checked.
    pub fn habits(&self, text: &str) -> Day {
        let mut day = Day::new();
        for line in text.lines() {
            let Some(item) = CHECKLIST_ITEM.captures(line) else {
                continue;
            };

            let checked = item["state"].eq_ignore_ascii_case("x");
            for tag in self.tag.find_iter(line) {
                *day.entry(tag.as_str().to_string()).or_default() |= checked;
            }
        }

        day
    }
}

fn date_of(name: &str) -> Option<NaiveDate> {
    let caps = DAILY_FILE.captures(name)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
