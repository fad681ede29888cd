use chrono::{Datelike, Days, NaiveDate};
use commonplace::error::Result;

pub const DEFAULT_WEEKS: u32 = 52;

/// An inclusive range of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Range {
    /// Resolves the requested bounds. A missing `to` means `today`. A missing
    /// `from` means a window of `weeks` whole weeks ending at `to`.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        weeks: u32,
        today: NaiveDate,
    ) -> Result<Range> {
        let to = to.unwrap_or(today);
        let from = match from {
            Some(from) => from,
            None => {
                let span = u64::from(weeks.max(1)) * 7 - 1;
                to.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN)
            }
        };

        if from > to {
            return commonplace::err!("--from must be on or before --to",
                "from" => from, "to" => to);
        }

        Ok(Range { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }

    /// Widens the range to whole weeks: back to a Monday, forward to a
    /// Sunday.
    pub fn whole_weeks(&self) -> Range {
        let back = self.from.weekday().num_days_from_monday();
        let forward = 6 - self.to.weekday().num_days_from_monday();
        Range {
            from: self.from - Days::new(back.into()),
            to: self.to + Days::new(forward.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn explicit_bounds() {
        let range = Range::resolve(Some(date("2024-01-01")), Some(date("2024-01-07")), 52, date("2030-01-01")).unwrap();
        assert_eq!(range, Range { from: date("2024-01-01"), to: date("2024-01-07") });
        assert_eq!(range.days().count(), 7);
    }

    #[test]
    fn windows() {
        let today = date("2024-06-30");

        let trailing = Range::resolve(None, None, 2, today).unwrap();
        assert_eq!(trailing, Range { from: date("2024-06-17"), to: today });
        assert_eq!(trailing.days().count(), 14);

        let ending = Range::resolve(None, Some(date("2024-01-14")), 1, today).unwrap();
        assert_eq!(ending, Range { from: date("2024-01-08"), to: date("2024-01-14") });

        let starting = Range::resolve(Some(date("2024-06-01")), None, 1, today).unwrap();
        assert_eq!(starting, Range { from: date("2024-06-01"), to: today });
    }

    #[test]
    fn inverted_bounds_are_an_error() {
        let error = Range::resolve(Some(date("2024-02-01")), Some(date("2024-01-01")), 52, date("2024-06-30"))
            .unwrap_err();

        assert_eq!(error.message(), "--from must be on or before --to");
    }

    #[test]
    fn whole_weeks_snap_to_monday_and_sunday() {
        // 2024-01-03 is a Wednesday.
        let range = Range { from: date("2024-01-03"), to: date("2024-01-03") };
        assert_eq!(range.whole_weeks(), Range { from: date("2024-01-01"), to: date("2024-01-07") });

        let aligned = Range { from: date("2024-01-01"), to: date("2024-01-14") };
        assert_eq!(aligned.whole_weeks(), aligned);
    }
}
