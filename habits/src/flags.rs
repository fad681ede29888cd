use std::path::PathBuf;

use chrono::NaiveDate;

use crate::range::DEFAULT_WEEKS;

xflags::xflags! {
    /// Renders a heatmap of the habit checklists kept in daily notes.
    cmd habits {
        /// Directory of `YYYY-MM-DD.md` daily notes (default: the current directory).
        optional --vault dir: PathBuf
        /// First day shown, as `YYYY-MM-DD`.
        optional --from date: NaiveDate
        /// Last day shown, as `YYYY-MM-DD` (default: today).
        optional --to date: NaiveDate
        /// Weeks shown when `--from` is omitted (default: 52).
        optional --weeks n: u32
        /// Tag prefix marking habits (default: `habits`).
        optional --tag prefix: String
    }
}

impl Habits {
    pub fn vault(&self) -> PathBuf {
        self.vault.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn weeks(&self) -> u32 {
        self.weeks.unwrap_or(DEFAULT_WEEKS)
    }

    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("habits")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let flags = Habits::from_vec(vec![]).unwrap();
        assert_eq!(flags.vault(), PathBuf::from("."));
        assert_eq!(flags.weeks(), 52);
        assert_eq!(flags.tag(), "habits");
        assert!(flags.from.is_none() && flags.to.is_none());
    }

    #[test]
    fn parses_dates() {
        let flags = Habits::from_vec(vec![
            "--from".into(),
            "2024-01-01".into(),
            "--to".into(),
            "2024-01-07".into(),
            "--tag".into(),
            "chores".into(),
        ]).unwrap();

        assert_eq!(flags.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(flags.to, NaiveDate::from_ymd_opt(2024, 1, 7));
        assert_eq!(flags.tag(), "chores");
        assert!(Habits::from_vec(vec!["--from".into(), "January".into()]).is_err());
    }
}
