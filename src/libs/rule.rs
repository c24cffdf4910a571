//! Recurring weekly schedule rules.
//!
//! A [`ScheduleRule`] describes an inclusive date range, a time window for
//! each enabled weekday and a set of excluded dates. The same type backs a
//! group's base schedule and every temporary override.
//!
//! Rules arrive from forms and files as a [`RawRule`], the loosely typed
//! payload the school's screens exchange:
//!
//! ```json
//! {
//!   "start_date": "2024-09-01",
//!   "end_date": "2024-09-30",
//!   "days": { "0": { "enabled": true, "start": "17:00", "end": "18:30" } },
//!   "exclusions": ["2024-09-04"]
//! }
//! ```
//!
//! Weekday keys are normalised to `chrono::Weekday` at this boundary, so the
//! rest of the crate never sees the string/number ambiguity.
//!
//! [`ScheduleRule::session_on`] is the single predicate deciding whether a
//! date carries a session. Both [`count_sessions`] (the preview) and the
//! materializer go through it.

use super::error::{Result, ScheduleError};
use super::time::{days_between, format_date, format_time, parse_date, parse_time, parse_weekday, weekday_index, WEEKDAYS};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Start and end time of the lessons held on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DayWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if end <= start {
            return Err(ScheduleError::TimeRange { start, end });
        }
        Ok(Self { start, end })
    }
}

/// A validated recurring pattern.
///
/// Invariants held by construction: `end_date >= start_date` and every
/// window ends after it starts. A rule without enabled weekdays is
/// representable (it simply yields no sessions); the engine refuses to
/// generate from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRule {
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: [Option<DayWindow>; 7],
    exclusions: BTreeSet<NaiveDate>,
}

/// How strictly [`ScheduleRule::from_raw`] validates its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// The rule will be generated from; at least one weekday is required.
    Generate,
    /// Preview of an incomplete form; zero weekdays is fine.
    Preview,
}

impl ScheduleRule {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if end_date < start_date {
            return Err(ScheduleError::Range { start: start_date, end: end_date });
        }
        Ok(Self {
            start_date,
            end_date,
            days: [None; 7],
            exclusions: BTreeSet::new(),
        })
    }

    /// Enables `day` with the given lesson window.
    pub fn with_day(mut self, day: Weekday, start: NaiveTime, end: NaiveTime) -> Result<Self> {
        self.set_day(day, DayWindow::new(start, end)?);
        Ok(self)
    }

    pub fn set_day(&mut self, day: Weekday, window: DayWindow) {
        self.days[weekday_index(day) as usize] = Some(window);
    }

    pub fn exclude(mut self, date: NaiveDate) -> Self {
        self.exclusions.insert(date);
        self
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn window(&self, day: Weekday) -> Option<DayWindow> {
        self.days[weekday_index(day) as usize]
    }

    /// Enabled weekdays in Monday..Sunday order.
    pub fn days(&self) -> impl Iterator<Item = (Weekday, DayWindow)> + '_ {
        WEEKDAYS.iter().filter_map(move |&day| self.window(day).map(|w| (day, w)))
    }

    pub fn exclusions(&self) -> &BTreeSet<NaiveDate> {
        &self.exclusions
    }

    pub fn has_weekdays(&self) -> bool {
        self.days.iter().any(Option::is_some)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// The lesson window on `date`, if the rule generates a session there.
    pub fn session_on(&self, date: NaiveDate) -> Option<DayWindow> {
        if !self.contains(date) || self.exclusions.contains(&date) {
            return None;
        }
        self.window(date.weekday())
    }

    /// Every generated `(date, window)` pair in date order.
    pub fn occurrences(&self) -> impl Iterator<Item = (NaiveDate, DayWindow)> + '_ {
        days_between(self.start_date, self.end_date).filter_map(move |date| self.session_on(date).map(|w| (date, w)))
    }

    /// The same weekday windows over a different range, keeping only the
    /// exclusions that fall inside it. Used when an override is clipped.
    pub fn with_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        let mut clipped = Self::new(start_date, end_date)?;
        clipped.days = self.days;
        clipped.exclusions = self.exclusions.iter().copied().filter(|d| clipped.contains(*d)).collect();
        Ok(clipped)
    }

    /// Parses a rule that is going to be generated from.
    pub fn parse(raw: &RawRule) -> Result<Self> {
        Self::from_raw(raw, ParseMode::Generate)
    }

    pub fn from_raw(raw: &RawRule, mode: ParseMode) -> Result<Self> {
        let start_date = parse_date(&raw.start_date)?;
        let end_date = parse_date(&raw.end_date)?;
        let mut rule = Self::new(start_date, end_date)?;

        let mut seen = std::collections::HashSet::new();
        for (key, day) in &raw.days {
            let weekday = parse_weekday(key)?;
            // "0" and "mon" name the same day; neither may shadow the other.
            if !seen.insert(weekday) {
                return Err(ScheduleError::InvalidWeekday { value: key.clone() });
            }
            if !day.enabled {
                continue;
            }
            let window = DayWindow::new(parse_time(&day.start)?, parse_time(&day.end)?)?;
            rule.set_day(weekday, window);
        }

        for value in &raw.exclusions {
            rule.exclusions.insert(parse_date(value)?);
        }

        if mode == ParseMode::Generate && !rule.has_weekdays() {
            return Err(ScheduleError::NoWeekdaysSelected);
        }
        Ok(rule)
    }

    pub fn to_raw(&self) -> RawRule {
        RawRule {
            start_date: format_date(self.start_date),
            end_date: format_date(self.end_date),
            days: self
                .days()
                .map(|(day, w)| {
                    (
                        weekday_index(day).to_string(),
                        RawDay {
                            enabled: true,
                            start: format_time(w.start),
                            end: format_time(w.end),
                        },
                    )
                })
                .collect(),
            exclusions: self.exclusions.iter().map(|d| format_date(*d)).collect(),
        }
    }
}

/// Number of sessions `rule` generates.
pub fn count_sessions(rule: &ScheduleRule) -> usize {
    rule.occurrences().count()
}

/// Session count for a form that may still be incomplete.
pub fn preview_count(raw: &RawRule) -> Result<usize> {
    Ok(count_sessions(&ScheduleRule::from_raw(raw, ParseMode::Preview)?))
}

/// Schedule payload as exchanged with forms and JSON files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRule {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub days: BTreeMap<String, RawDay>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDay {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

fn enabled_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(days: &[(&str, bool, &str, &str)], exclusions: &[&str]) -> RawRule {
        RawRule {
            start_date: "2024-09-01".into(),
            end_date: "2024-09-30".into(),
            days: days
                .iter()
                .map(|(k, enabled, s, e)| {
                    (
                        k.to_string(),
                        RawDay {
                            enabled: *enabled,
                            start: s.to_string(),
                            end: e.to_string(),
                        },
                    )
                })
                .collect(),
            exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_september_example_counts_eight() {
        let rule = ScheduleRule::parse(&raw(&[("0", true, "17:00", "18:30"), ("2", true, "17:00", "18:30")], &["2024-09-04"])).unwrap();
        assert_eq!(count_sessions(&rule), 8);
        assert!(rule.session_on(NaiveDate::from_ymd_opt(2024, 9, 4).unwrap()).is_none());
        assert!(rule.session_on(NaiveDate::from_ymd_opt(2024, 9, 11).unwrap()).is_some());
    }

    #[test]
    fn test_validation_errors() {
        let mut bad = raw(&[("0", true, "17:00", "18:30")], &[]);
        bad.end_date = "2024-08-01".into();
        assert!(matches!(ScheduleRule::parse(&bad), Err(ScheduleError::Range { .. })));

        let bad = raw(&[("0", true, "18:30", "17:00")], &[]);
        assert!(matches!(ScheduleRule::parse(&bad), Err(ScheduleError::TimeRange { .. })));

        let bad = raw(&[("0", true, "17", "18:30")], &[]);
        assert!(matches!(ScheduleRule::parse(&bad), Err(ScheduleError::TimeFormat { .. })));

        let bad = raw(&[("0", true, "17:00", "18:30")], &["2024-9-x"]);
        assert!(matches!(ScheduleRule::parse(&bad), Err(ScheduleError::DateFormat { .. })));

        let twice = raw(&[("0", true, "17:00", "18:30"), ("mon", true, "09:00", "10:00")], &[]);
        assert!(matches!(ScheduleRule::parse(&twice), Err(ScheduleError::InvalidWeekday { .. })));
        let twice = raw(&[("Friday", false, "", ""), ("4", true, "09:00", "10:00")], &[]);
        assert!(matches!(preview_count(&twice), Err(ScheduleError::InvalidWeekday { .. })));

        let none = raw(&[("0", false, "", "")], &[]);
        assert!(matches!(ScheduleRule::parse(&none), Err(ScheduleError::NoWeekdaysSelected)));
        assert_eq!(preview_count(&none).unwrap(), 0);
    }

    #[test]
    fn test_with_range_keeps_days_and_clips_exclusions() {
        let rule = ScheduleRule::parse(&raw(&[("tue", true, "10:00", "11:00")], &["2024-09-03", "2024-09-24"])).unwrap();
        let clipped = rule
            .with_range(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 9, 9).unwrap())
            .unwrap();
        assert_eq!(clipped.window(Weekday::Tue), rule.window(Weekday::Tue));
        assert_eq!(clipped.exclusions().len(), 1);
        assert!(clipped.exclusions().contains(&NaiveDate::from_ymd_opt(2024, 9, 3).unwrap()));
    }

    #[test]
    fn test_raw_payload_roundtrip_normalises_keys() {
        let rule = ScheduleRule::parse(&raw(&[("Monday", true, "17:00", "18:30")], &[])).unwrap();
        let back = rule.to_raw();
        assert!(back.days.contains_key("0"));
        assert_eq!(ScheduleRule::parse(&back).unwrap(), rule);
    }
}
