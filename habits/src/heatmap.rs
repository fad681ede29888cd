//! Turning daily habit records into a calendar heatmap and a summary.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use colored::Colorize;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::journal::Day;
use crate::range::Range;

const GLYPH: &str = "■ ";
const BLANK: &str = "  ";

/// Fill colours for the five levels, dimmest first.
const LEVEL_COLORS: [(u8, u8, u8); 5] = [
    (0x0b, 0x1f, 0x0b),
    (0x0b, 0x2d, 0x0b),
    (0x18, 0x63, 0x18),
    (0x2b, 0xd4, 0x2b),
    (0x9d, 0xff, 0x9d),
];

const NO_ACTIVITY_COLOR: (u8, u8, u8) = (0x5a, 0x5a, 0x5a);

/// Shading used when output isn't coloured.
const PLAIN_GLYPHS: [&str; 5] = ["· ", "░ ", "▒ ", "▓ ", "█ "];

/// How many of a day's habits were checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub checked: usize,
}

impl Tally {
    pub fn of(day: &Day) -> Option<Tally> {
        if day.is_empty() {
            return None;
        }

        let checked = day.values().filter(|c| **c).count();
        Some(Tally { total: day.len(), checked })
    }

    pub fn ratio(&self) -> f64 {
        match self.total {
            0 => 0.0,
            total => self.checked as f64 / total as f64,
        }
    }
}

/// Buckets a completion ratio into one of five intensity levels.
pub fn level(ratio: f64) -> usize {
    match ratio {
        r if r <= 0.0 => 0,
        r if r < 0.25 => 1,
        r if r < 0.5 => 2,
        r if r < 0.75 => 3,
        _ => 4,
    }
}

/// Days checked and days recorded for one habit tag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HabitStats {
    pub days: usize,
    pub checked: usize,
}

impl HabitStats {
    pub fn percent(&self) -> f64 {
        match self.days {
            0 => 0.0,
            days => self.checked as f64 / days as f64 * 100.0,
        }
    }
}

/// Every day of a range with its tally, plus per-habit totals.
#[derive(Debug)]
pub struct Heatmap {
    pub range: Range,
    pub days: BTreeMap<NaiveDate, Option<Tally>>,
    pub habits: BTreeMap<String, HabitStats>,
}

impl Heatmap {
    pub fn collect(range: Range, mut day: impl FnMut(NaiveDate) -> Day) -> Heatmap {
        let mut days = BTreeMap::new();
        let mut habits = BTreeMap::<String, HabitStats>::new();
        for date in range.days() {
            let record = day(date);
            for (tag, checked) in &record {
                let stats = habits.entry(tag.clone()).or_default();
                stats.days += 1;
                stats.checked += usize::from(*checked);
            }

            days.insert(date, Tally::of(&record));
        }

        Heatmap { range, days, habits }
    }

    pub fn tally(&self, date: NaiveDate) -> Option<Tally> {
        self.days.get(&date).copied().flatten()
    }

    /// The grid's columns: whole Monday-to-Sunday weeks covering the range.
    pub fn weeks(&self) -> Vec<Vec<NaiveDate>> {
        let days: Vec<_> = self.range.whole_weeks().days().collect();
        days.chunks(7).map(|week| week.to_vec()).collect()
    }

    /// The level a day is drawn at, or `None` for a day with no activity.
    pub fn cell(&self, date: NaiveDate) -> Option<usize> {
        if !self.range.contains(date) {
            return None;
        }

        self.tally(date)
            .filter(|t| t.checked > 0)
            .map(|t| level(t.ratio()))
    }

    pub fn summary(&self) -> Summary {
        let tracked: Vec<_> = self.days.values().flatten().collect();
        let inactive = self.days.values()
            .filter(|t| t.map_or(true, |t| t.checked == 0))
            .count();

        let average = match tracked.len() {
            0 => 0.0,
            n => tracked.iter().map(|t| t.ratio()).sum::<f64>() / n as f64,
        };

        Summary { tracked: tracked.len(), average, inactive }
    }

    /// Per-habit totals, highest completion first.
    pub fn ranking(&self) -> Vec<(&str, HabitStats)> {
        let mut rows: Vec<_> = self.habits.iter()
            .map(|(tag, stats)| (tag.as_str(), *stats))
            .collect();

        rows.sort_by(|a, b| b.1.percent().total_cmp(&a.1.percent()));
        rows
    }

    /// Draws the grid, the summary line, and the per-habit table. Days after
    /// `today` are left blank. Without colour, levels are shown by shading.
    pub fn render(&self, today: NaiveDate) -> String {
        let color = colored::control::SHOULD_COLORIZE.should_colorize();
        let weeks = self.weeks();
        let mut out = String::new();
        for weekday in 0..7 {
            let mut row = String::new();
            for week in &weeks {
                let date = week[weekday];
                if date > today {
                    row.push_str(BLANK);
                    continue;
                }

                let level = self.cell(date);
                if color {
                    let (r, g, b) = level.map_or(NO_ACTIVITY_COLOR, |l| LEVEL_COLORS[l]);
                    row.push_str(&GLYPH.truecolor(r, g, b).to_string());
                } else {
                    row.push_str(level.map_or(PLAIN_GLYPHS[0], |l| PLAIN_GLYPHS[l]));
                }
            }

            out.push_str(row.trim_end());
            out.push('\n');
        }

        let width = weeks.len() * GLYPH.chars().count();
        out.push_str(&self.summary().line(width));
        out.push('\n');

        let ranking = self.ranking();
        if !ranking.is_empty() {
            out.push_str("\n\n");
            out.push_str(&table(&ranking));
            out.push('\n');
        }

        out
    }
}

/// Summary statistics over a whole range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Days with at least one habit recorded.
    pub tracked: usize,
    /// Mean completion ratio over tracked days.
    pub average: f64,
    /// Days with nothing recorded or nothing checked.
    pub inactive: usize,
}

impl Summary {
    /// Spreads the three statistics across `width` columns, falling back to
    /// ` | ` separators when they don't fit.
    pub fn line(&self, width: usize) -> String {
        let parts = [
            format!("Tracked: {} days", self.tracked),
            format!("Avg: {:.0}%", self.average * 100.0),
            format!("No activity: {} days", self.inactive),
        ];

        let used: usize = parts.iter().map(|p| p.chars().count()).sum();
        let spaces = width.saturating_sub(used);
        if spaces < 2 {
            return parts.join(" | ");
        }

        let first = spaces / 2 + spaces % 2;
        let second = spaces / 2;
        format!("{}{}{}{}{}", parts[0], " ".repeat(first), parts[1], " ".repeat(second), parts[2])
    }
}

#[derive(Tabled)]
struct HabitRow<'a> {
    #[tabled(rename = "Habit")]
    habit: &'a str,
    #[tabled(rename = "Checked")]
    checked: String,
    #[tabled(rename = "%")]
    percent: String,
}

fn table(ranking: &[(&str, HabitStats)]) -> String {
    let rows = ranking.iter().map(|(habit, stats)| HabitRow {
        habit: *habit,
        checked: format!("{}/{}", stats.checked, stats.days),
        percent: format!("{:.0}", stats.percent()),
    });

    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.with(Modify::new(Columns::new(1..)).with(Alignment::right()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn day(habits: &[(&str, bool)]) -> Day {
        habits.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    fn first_week() -> Heatmap {
        let range = Range { from: date("2024-01-01"), to: date("2024-01-07") };
        Heatmap::collect(range, |d| match d == date("2024-01-03") {
            true => day(&[("#habits/a", true), ("#habits/b", true), ("#habits/c", false)]),
            false => Day::new(),
        })
    }

    #[test]
    fn levels() {
        assert_eq!(level(0.0), 0);
        assert_eq!(level(0.1), 1);
        assert_eq!(level(0.25), 2);
        assert_eq!(level(0.5), 3);
        assert_eq!(level(0.74), 3);
        assert_eq!(level(0.75), 4);
        assert_eq!(level(1.0), 4);
    }

    #[test]
    fn one_tracked_day() {
        let heatmap = first_week();

        let tally = heatmap.tally(date("2024-01-03")).unwrap();
        assert_eq!(tally, Tally { total: 3, checked: 2 });
        assert!((tally.ratio() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(heatmap.cell(date("2024-01-03")), Some(3));

        let empty = heatmap.range.days().filter(|d| heatmap.tally(*d).is_none()).count();
        assert_eq!(empty, 6);

        let weeks = heatmap.weeks();
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0][0], date("2024-01-01"));

        let summary = heatmap.summary();
        assert_eq!((summary.tracked, summary.inactive), (1, 6));
        assert_eq!(summary.line(0), "Tracked: 1 days | Avg: 67% | No activity: 6 days");
    }

    #[test]
    fn grid_pads_to_whole_weeks() {
        // Wednesday through the following Tuesday.
        let range = Range { from: date("2024-01-03"), to: date("2024-01-09") };
        let heatmap = Heatmap::collect(range, |_| Day::new());
        let weeks = heatmap.weeks();

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0][0], date("2024-01-01"));
        assert_eq!(weeks[1][6], date("2024-01-14"));
        assert_eq!(heatmap.cell(date("2024-01-01")), None);
    }

    #[test]
    fn unchecked_days_count_as_inactive() {
        let range = Range { from: date("2024-01-01"), to: date("2024-01-02") };
        let heatmap = Heatmap::collect(range, |_| day(&[("#habits/a", false)]));

        assert_eq!(heatmap.cell(date("2024-01-01")), None);
        let summary = heatmap.summary();
        assert_eq!((summary.tracked, summary.inactive), (2, 2));
        assert_eq!(summary.average, 0.0);
    }

    #[test]
    fn ranking_orders_by_completion() {
        let range = Range { from: date("2024-01-01"), to: date("2024-01-04") };
        let heatmap = Heatmap::collect(range, |d| {
            let even = d.day() % 2 == 0;
            day(&[("#habits/always", true), ("#habits/never", false), ("#habits/half", even)])
        });

        let ranking: Vec<_> = heatmap.ranking().into_iter()
            .map(|(tag, s)| (tag, s.checked, s.days))
            .collect();

        assert_eq!(ranking, [("#habits/always", 4, 4), ("#habits/half", 2, 4), ("#habits/never", 0, 4)]);
    }

    #[test]
    fn stats_line_fills_the_grid_width() {
        let summary = Summary { tracked: 1, average: 0.5, inactive: 2 };
        let line = summary.line(60);
        assert_eq!(line.chars().count(), 60);
        assert!(line.starts_with("Tracked: 1 days "));
        assert!(line.ends_with(" No activity: 2 days"));
        assert_eq!(summary.line(10), "Tracked: 1 days | Avg: 50% | No activity: 2 days");
    }

    #[test]
    fn renders_plain_text() {
        colored::control::set_override(false);
        let heatmap = first_week();
        let text = heatmap.render(date("2024-01-05"));
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "·");
        assert_eq!(lines[2], "▓");
        assert_eq!(lines[4], "·");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "");
        assert!(lines[7].starts_with("Tracked: 1 days"));
        assert!(text.contains("#habits/a"));
        assert!(text.contains("Habit"));
    }

    #[test]
    fn habit_table_lists_best_first() {
        let ranking = [
            ("#habits/read", HabitStats { days: 4, checked: 3 }),
            ("#habits/run", HabitStats { days: 3, checked: 1 }),
        ];

        let text = table(&ranking);
        let header = text.lines().find(|l| l.contains("Habit")).unwrap();
        assert!(header.contains("Checked") && header.contains('%'));

        let rows: Vec<_> = text.lines().filter(|l| l.contains("#habits/")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("#habits/read") && rows[0].contains("3/4") && rows[0].contains("75"));
        assert!(rows[1].contains("#habits/run") && rows[1].contains("1/3") && rows[1].contains("33"));
    }
}
