//! Time expression detection and resolution.
//!
//! Detects day anchors ("today", "tomorrow", "by friday", "in 3 days",
//! "next week", "2025-04-01", "12 march") and clock times ("3pm", "15:30",
//! "noon"). A clock time close to a day anchor in the same clause is attached
//! to it, so "tomorrow at 3pm" is a single expression. Resolution is relative
//! to a caller-supplied `now` and happens in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Maximum number of characters between a day anchor and a clock time for
/// the two to be merged.
const ATTACH_DISTANCE: usize = 12;

/// What a time expression is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeAnchor {
    Today,
    Tonight,
    Tomorrow,
    Weekday { weekday: Weekday },
    EndOfWeek,
    NextWeek,
    InDays { days: u32 },
    InHours { hours: u32 },
    Date { date: NaiveDate },
    MonthDay { month: u32, day: u32 },
    /// A clock time with no day attached
    ClockOnly,
}

/// A detected time expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeExpression {
    /// Matched text, including an attached clock time
    pub text: String,
    pub anchor: TimeAnchor,
    pub time_of_day: Option<NaiveTime>,
    /// Byte offset of the match in the analyzed text
    pub start: usize,
}

impl TimeExpression {
    /// Resolve to a concrete instant relative to `now`.
    ///
    /// Day anchors without a clock time resolve to `default_due_hour`.
    /// Returns `None` for impossible calendar dates.
    pub fn resolve(&self, now: DateTime<Utc>, default_due_hour: u32) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let due = NaiveTime::from_hms_opt(default_due_hour.min(23), 0, 0)?;
        let at = |date: NaiveDate, fallback: NaiveTime| -> DateTime<Utc> {
            Utc.from_utc_datetime(&date.and_time(self.time_of_day.unwrap_or(fallback)))
        };

        let resolved = match &self.anchor {
            TimeAnchor::Today => {
                let candidate = at(today, due);
                if self.time_of_day.is_none() && candidate <= now {
                    at(today, NaiveTime::from_hms_opt(23, 59, 0)?)
                } else {
                    candidate
                }
            }
            TimeAnchor::Tonight => at(today, NaiveTime::from_hms_opt(21, 0, 0)?),
            TimeAnchor::Tomorrow => at(today.succ_opt()?, due),
            TimeAnchor::Weekday { weekday } => {
                let mut ahead = days_until(now.weekday(), *weekday);
                if ahead == 0 {
                    ahead = 7;
                }
                at(today + Duration::days(ahead), due)
            }
            TimeAnchor::EndOfWeek => {
                let ahead = days_until(now.weekday(), Weekday::Fri);
                let candidate = at(today + Duration::days(ahead), due);
                if candidate <= now {
                    at(today + Duration::days(ahead + 7), due)
                } else {
                    candidate
                }
            }
            TimeAnchor::NextWeek => {
                let to_monday = 7 - now.weekday().num_days_from_monday() as i64;
                at(today + Duration::days(to_monday + 4), due)
            }
            TimeAnchor::InDays { days } => {
                let days = Duration::days(i64::from(*days));
                match self.time_of_day {
                    Some(time) => at(today.checked_add_signed(days)?, time),
                    None => now.checked_add_signed(days)?,
                }
            }
            TimeAnchor::InHours { hours } => {
                now.checked_add_signed(Duration::hours(i64::from(*hours)))?
            }
            TimeAnchor::Date { date } => at(*date, due),
            TimeAnchor::MonthDay { month, day } => {
                let this_year = NaiveDate::from_ymd_opt(today.year(), *month, *day);
                let date = match this_year {
                    Some(date) if date >= today => date,
                    _ => NaiveDate::from_ymd_opt(today.year() + 1, *month, *day)?,
                };
                at(date, due)
            }
            TimeAnchor::ClockOnly => {
                let candidate = at(today, due);
                if candidate <= now {
                    at(today.succ_opt()?, due)
                } else {
                    candidate
                }
            }
        };
        Some(resolved)
    }
}

fn days_until(from: Weekday, to: Weekday) -> i64 {
    let from = from.num_days_from_monday() as i64;
    let to = to.num_days_from_monday() as i64;
    (to - from).rem_euclid(7)
}

struct Patterns {
    relative_day: Regex,
    weekday: Regex,
    end_of_week: Regex,
    next_week: Regex,
    in_n: Regex,
    iso_date: Regex,
    day_month: Regex,
    month_day: Regex,
    clock_12h: Regex,
    clock_24h: Regex,
    clock_named: Regex,
}

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |pattern: &str| Regex::new(pattern).expect("static regex must compile");
        Patterns {
            relative_day: build(r"(?i)\b(today|tonight|tomorrow|tmrw|end of (?:the )?day|eod)\b"),
            weekday: build(
                r"(?i)\b(?:(?:by|on|before|until|next|this)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            ),
            end_of_week: build(r"(?i)\b(?:by\s+)?end of (?:the |this )?week\b"),
            next_week: build(r"(?i)\bnext week\b"),
            in_n: build(
                r"(?i)\bin\s+(\d{1,3}|a couple of|couple of|an|a|one|two|three|four|five|six|seven|eight|nine|ten)\s+(hours?|days?|weeks?)\b",
            ),
            iso_date: build(r"\b(\d{4})-(\d{2})-(\d{2})\b"),
            day_month: build(&format!(
                r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b"
            )),
            month_day: build(&format!(
                r"(?i)\b({MONTHS})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b"
            )),
            clock_12h: build(r"(?i)\b(?:at\s+)?(\d{1,2})(?::([0-5]\d))?\s*(am|pm)\b"),
            clock_24h: build(r"\b(?:at\s+)?([01]?\d|2[0-3]):([0-5]\d)\b"),
            clock_named: build(r"(?i)\b(?:at\s+)?(noon|midday|midnight)\b"),
        }
    })
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_ascii_lowercase().chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    name.to_ascii_lowercase().parse::<Weekday>().ok()
}

fn count_from_word(word: &str) -> Option<u32> {
    let word = word.to_ascii_lowercase();
    let count = match word.as_str() {
        "a" | "an" | "one" => 1,
        "a couple of" | "couple of" | "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => return digits.parse().ok(),
    };
    Some(count)
}

#[derive(Debug)]
struct Span<T> {
    start: usize,
    end: usize,
    value: T,
}

fn overlaps<T, U>(a: &Span<T>, b: &Span<U>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Keep the longest non-overlapping spans, earliest first.
fn non_overlapping<T>(mut spans: Vec<Span<T>>) -> Vec<Span<T>> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then((b.end - b.start).cmp(&(a.end - a.start))));
    let mut kept: Vec<Span<T>> = Vec::new();
    for span in spans {
        if kept.iter().all(|k| !overlaps(k, &span)) {
            kept.push(span);
        }
    }
    kept
}

fn day_anchors(text: &str) -> Vec<Span<TimeAnchor>> {
    let p = patterns();
    let mut spans = Vec::new();

    for caps in p.relative_day.captures_iter(text) {
        let m = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
        let word = caps[1].to_ascii_lowercase();
        let anchor = match word.as_str() {
            "tonight" => TimeAnchor::Tonight,
            "tomorrow" | "tmrw" => TimeAnchor::Tomorrow,
            _ => TimeAnchor::Today,
        };
        spans.push(Span { start: m.0, end: m.1, value: anchor });
    }

    for caps in p.weekday.captures_iter(text) {
        let Some(weekday) = weekday_from_name(&caps[1]) else {
            continue;
        };
        if let Some(m) = caps.get(0) {
            spans.push(Span {
                start: m.start(),
                end: m.end(),
                value: TimeAnchor::Weekday { weekday },
            });
        }
    }

    for m in p.end_of_week.find_iter(text) {
        spans.push(Span { start: m.start(), end: m.end(), value: TimeAnchor::EndOfWeek });
    }
    for m in p.next_week.find_iter(text) {
        spans.push(Span { start: m.start(), end: m.end(), value: TimeAnchor::NextWeek });
    }

    for caps in p.in_n.captures_iter(text) {
        let (Some(m), Some(count)) = (caps.get(0), count_from_word(&caps[1])) else {
            continue;
        };
        let unit = caps[2].to_ascii_lowercase();
        let anchor = if unit.starts_with("hour") {
            TimeAnchor::InHours { hours: count }
        } else if unit.starts_with("week") {
            TimeAnchor::InDays { days: count.saturating_mul(7) }
        } else {
            TimeAnchor::InDays { days: count }
        };
        spans.push(Span { start: m.start(), end: m.end(), value: anchor });
    }

    for caps in p.iso_date.captures_iter(text) {
        let parsed = (|| {
            let year = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let day = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })();
        if let (Some(m), Some(date)) = (caps.get(0), parsed) {
            spans.push(Span { start: m.start(), end: m.end(), value: TimeAnchor::Date { date } });
        }
    }

    let mut month_day = |m: regex::Match<'_>, month: &str, day: &str| {
        let (Some(month), Ok(day)) = (month_number(month), day.parse::<u32>()) else {
            return;
        };
        // Reject impossible days up front; leap days are settled at resolve time.
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return;
        }
        spans.push(Span {
            start: m.start(),
            end: m.end(),
            value: TimeAnchor::MonthDay { month, day },
        });
    };
    for caps in p.day_month.captures_iter(text) {
        if let Some(m) = caps.get(0) {
            month_day(m, &caps[2], &caps[1]);
        }
    }
    for caps in p.month_day.captures_iter(text) {
        if let Some(m) = caps.get(0) {
            month_day(m, &caps[1], &caps[2]);
        }
    }

    non_overlapping(spans)
}

fn clock_times(text: &str) -> Vec<Span<NaiveTime>> {
    let p = patterns();
    let mut spans = Vec::new();

    for caps in p.clock_12h.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let Ok(hour) = caps[1].parse::<u32>() else { continue };
        if !(1..=12).contains(&hour) {
            continue;
        }
        let minute = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let pm = caps[3].eq_ignore_ascii_case("pm");
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            spans.push(Span { start: m.start(), end: m.end(), value: time });
        }
    }

    for caps in p.clock_24h.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let (Ok(hour), Ok(minute)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            spans.push(Span { start: m.start(), end: m.end(), value: time });
        }
    }

    for caps in p.clock_named.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let hour = if caps[1].eq_ignore_ascii_case("midnight") { 0 } else { 12 };
        if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
            spans.push(Span { start: m.start(), end: m.end(), value: time });
        }
    }

    non_overlapping(spans)
}

fn gap_is_same_clause(text: &str, from: usize, to: usize) -> bool {
    to >= from
        && to - from <= ATTACH_DISTANCE
        && text
            .get(from..to)
            .is_some_and(|gap| !gap.contains(['.', '!', '?', '\n', ';']))
}

/// Detect all time expressions in `text`, ordered by position.
pub fn detect(text: &str) -> Vec<TimeExpression> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let anchors = day_anchors(text);
    let clocks: Vec<Span<NaiveTime>> = clock_times(text)
        .into_iter()
        .filter(|clock| anchors.iter().all(|a| !overlaps(a, clock)))
        .collect();

    let mut attached: Vec<Option<usize>> = vec![None; anchors.len()];
    let mut used = vec![false; clocks.len()];

    for (ai, anchor) in anchors.iter().enumerate() {
        if matches!(anchor.value, TimeAnchor::InHours { .. }) {
            continue;
        }
        let nearest = clocks
            .iter()
            .enumerate()
            .filter(|(ci, _)| !used[*ci])
            .filter_map(|(ci, clock)| {
                let distance = if clock.start >= anchor.end {
                    gap_is_same_clause(text, anchor.end, clock.start)
                        .then(|| clock.start - anchor.end)
                } else if anchor.start >= clock.end {
                    gap_is_same_clause(text, clock.end, anchor.start)
                        .then(|| anchor.start - clock.end)
                } else {
                    None
                };
                distance.map(|d| (ci, d))
            })
            .min_by_key(|(_, d)| *d);
        if let Some((ci, _)) = nearest {
            used[ci] = true;
            attached[ai] = Some(ci);
        }
    }

    let mut expressions: Vec<TimeExpression> = anchors
        .iter()
        .zip(attached)
        .map(|(anchor, clock)| {
            let clock = clock.map(|ci| &clocks[ci]);
            let start = clock.map_or(anchor.start, |c| c.start.min(anchor.start));
            let end = clock.map_or(anchor.end, |c| c.end.max(anchor.end));
            TimeExpression {
                text: text[start..end].trim().to_string(),
                anchor: anchor.value.clone(),
                time_of_day: clock.map(|c| c.value),
                start,
            }
        })
        .collect();

    expressions.extend(
        clocks
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(clock, _)| TimeExpression {
                text: text[clock.start..clock.end].trim().to_string(),
                anchor: TimeAnchor::ClockOnly,
                time_of_day: Some(clock.value),
                start: clock.start,
            }),
    );

    expressions.sort_by_key(|e| e.start);
    expressions
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn empty_text_has_no_expressions() {
        assert!(detect("").is_empty());
        assert!(detect("   ").is_empty());
        assert!(detect("Finish report asap").is_empty());
    }

    #[test]
    fn tomorrow_at_3pm_is_one_expression() {
        let found = detect("Let's meet tomorrow at 3pm to discuss budget");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].anchor, TimeAnchor::Tomorrow);
        assert_eq!(found[0].time_of_day, Some(hm(15, 0)));
        assert_eq!(found[0].text, "tomorrow at 3pm");
        assert_eq!(
            found[0].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 6, 15, 0, 0).unwrap())
        );
    }

    #[test]
    fn clock_before_day_attaches() {
        let found = detect("call at 9:30 on friday");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].anchor, TimeAnchor::Weekday { weekday: Weekday::Fri });
        assert_eq!(found[0].time_of_day, Some(hm(9, 30)));
    }

    #[test]
    fn by_weekday_resolves_to_next_occurrence() {
        let found = detect("Submit the form by Friday");
        assert_eq!(found[0].text, "by Friday");
        assert_eq!(
            found[0].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 7, 17, 0, 0).unwrap())
        );
        // Same weekday as today means a week from now.
        let wed = detect("wednesday");
        assert_eq!(
            wed[0].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 12, 17, 0, 0).unwrap())
        );
    }

    #[test]
    fn in_n_units() {
        let found = detect("ship it in 3 days, review in two hours, retro in a week");
        let anchors: Vec<_> = found.iter().map(|e| e.anchor.clone()).collect();
        assert_eq!(
            anchors,
            vec![
                TimeAnchor::InDays { days: 3 },
                TimeAnchor::InHours { hours: 2 },
                TimeAnchor::InDays { days: 7 },
            ]
        );
        assert_eq!(found[1].resolve(now(), 17), Some(now() + Duration::hours(2)));
    }

    #[test]
    fn far_future_offsets_do_not_resolve() {
        let expr = TimeExpression {
            text: "in many days".to_string(),
            anchor: TimeAnchor::InDays { days: u32::MAX },
            time_of_day: None,
            start: 0,
        };
        assert_eq!(expr.resolve(now(), 17), None);
    }

    #[test]
    fn explicit_dates() {
        let found = detect("due 2025-04-01 or maybe 12th March, or Jan 3");
        assert_eq!(found.len(), 3);
        assert_eq!(
            found[0].anchor,
            TimeAnchor::Date { date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap() }
        );
        assert_eq!(found[1].anchor, TimeAnchor::MonthDay { month: 3, day: 12 });
        // January 3rd already passed in 2025 -> next year
        assert_eq!(
            found[2].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2026, 1, 3, 17, 0, 0).unwrap())
        );
    }

    #[test]
    fn impossible_dates_are_skipped() {
        assert!(detect("2025-02-30").is_empty());
        assert!(detect("31 april").is_empty());
    }

    #[test]
    fn lone_clock_time_rolls_to_tomorrow_when_past() {
        let found = detect("standup at 9am");
        assert_eq!(found[0].anchor, TimeAnchor::ClockOnly);
        assert_eq!(
            found[0].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 6, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn today_without_time_uses_due_hour() {
        let found = detect("finish today");
        assert_eq!(
            found[0].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 5, 17, 0, 0).unwrap())
        );
        let late = Utc.with_ymd_and_hms(2025, 3, 5, 18, 0, 0).unwrap();
        assert_eq!(
            found[0].resolve(late, 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 5, 23, 59, 0).unwrap())
        );
    }

    #[test]
    fn next_week_and_end_of_week() {
        let found = detect("by end of week, then next week");
        assert_eq!(found[0].anchor, TimeAnchor::EndOfWeek);
        assert_eq!(found[1].anchor, TimeAnchor::NextWeek);
        assert_eq!(
            found[0].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 7, 17, 0, 0).unwrap())
        );
        assert_eq!(
            found[1].resolve(now(), 17),
            Some(Utc.with_ymd_and_hms(2025, 3, 14, 17, 0, 0).unwrap())
        );
    }

    #[test]
    fn clock_in_other_sentence_does_not_attach() {
        let found = detect("Tomorrow. At 3pm");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].time_of_day, None);
        assert_eq!(found[1].anchor, TimeAnchor::ClockOnly);
    }
}
