use crate::config::{DayLabel, ExpansionConfig};
use chrono::{Duration, NaiveDate};

/// Resolves template day labels and week numbers to calendar dates.
///
/// All arithmetic is in whole days on [`NaiveDate`]; there is no time-of-day or timezone component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekCalendar {
    day_labels: Vec<DayLabel>,
}

/// Result of matching a free-form day label against the canonical weekday list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayMatch<'a> {
    Canonical { index: usize, label: &'a str },
    Unmatched,
}

impl DayMatch<'_> {
    /// Index into the week (Monday = 0); unmatched labels fall back to 0.
    pub fn index(&self) -> usize {
        match self {
            DayMatch::Canonical { index, .. } => *index,
            DayMatch::Unmatched => 0,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, DayMatch::Canonical { .. })
    }
}

impl Default for WeekCalendar {
    fn default() -> Self {
        Self::from_config(&ExpansionConfig::default())
    }
}

impl WeekCalendar {
    pub fn new(day_labels: Vec<DayLabel>) -> Self {
        Self { day_labels }
    }

    pub fn from_config(config: &ExpansionConfig) -> Self {
        Self::new(config.day_labels.clone())
    }

    /// Case-insensitive containment match; the first canonical day (Monday first) whose label or
    /// alias occurs inside `day_of_week` wins, so "Thứ 2 (sáng)" still resolves to Monday.
    pub fn match_day(&self, day_of_week: &str) -> DayMatch<'_> {
        let needle = day_of_week.to_lowercase();
        for (index, day) in self.day_labels.iter().enumerate() {
            let hit = std::iter::once(&day.label)
                .chain(day.aliases.iter())
                .map(|candidate| candidate.to_lowercase())
                .any(|candidate| !candidate.is_empty() && needle.contains(&candidate));
            if hit {
                return DayMatch::Canonical {
                    index,
                    label: day.label.as_str(),
                };
            }
        }
        DayMatch::Unmatched
    }

    pub fn day_index(&self, day_of_week: &str) -> usize {
        self.match_day(day_of_week).index()
    }

    /// Label to store on generated rows: canonical when matched, the original text otherwise.
    pub fn display_label(&self, day_of_week: &str) -> String {
        match self.match_day(day_of_week) {
            DayMatch::Canonical { label, .. } => label.to_string(),
            DayMatch::Unmatched => day_of_week.to_string(),
        }
    }
}

/// `date` moved by whole weeks; `None` past the representable date range.
fn add_weeks(date: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_weeks(weeks)?)
}

/// Week-1 anchor derived from the date shown for `current_week`.
///
/// Walking back from the viewed week keeps the anchor stable while the user navigates weeks.
pub fn week1_anchor(view_date: NaiveDate, current_week: u32) -> Option<NaiveDate> {
    add_weeks(view_date, 1 - i64::from(current_week.max(1)))
}

pub fn resolve_week_start(week1_monday: NaiveDate, target_week: u32) -> Option<NaiveDate> {
    add_weeks(week1_monday, i64::from(target_week) - 1)
}

pub fn resolve_slot_date(week_start: NaiveDate, day_index: usize) -> Option<NaiveDate> {
    week_start.checked_add_signed(Duration::days(day_index.min(6) as i64))
}

/// Moves the viewed date by whole weeks when navigating from one week number to another.
pub fn shift_view_date(view_date: NaiveDate, from_week: u32, to_week: u32) -> Option<NaiveDate> {
    add_weeks(view_date, i64::from(to_week) - i64::from(from_week))
}

pub fn parse_iso(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}
