//! Deadline suggestion.
//!
//! An explicit time mention in the task text wins. Otherwise the deadline
//! follows the [`DeadlinePolicy`] for the task's priority:
//! - urgent/high: now + max(estimated duration, minimum lead hours)
//! - medium: now + N business days
//! - low: now + N days, rolled forward to Monday when it lands on a weekend

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::analysis::text::{term_matches, tokenize};
use crate::analysis::TimeExpression;
use crate::config::{DeadlinePolicy, MAX_POLICY_DAYS, MAX_POLICY_HOURS};
use crate::task::Priority;

/// Where a suggested deadline came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeadlineSource {
    /// Resolved from a time expression in the text
    ExplicitMention { text: String },
    /// Derived from priority and estimated duration
    PriorityPolicy,
}

/// Rough size of a task, judged from its wording and estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Assess from indicator words in `text` and the estimate.
    ///
    /// - Complex: two or more indicators, or 8h+ estimate
    /// - Moderate: one indicator, or 2h+ estimate
    pub fn assess(text: &str, estimated_minutes: Option<u32>, indicators: &[String]) -> Self {
        let tokens = tokenize(text);
        let hits = indicators
            .iter()
            .filter(|word| {
                let word = word.to_lowercase();
                tokens.iter().any(|t| term_matches(t, &word))
            })
            .count();
        let minutes = estimated_minutes.unwrap_or(0);

        if hits >= 2 || minutes >= 480 {
            Complexity::Complex
        } else if hits == 1 || minutes >= 120 {
            Complexity::Moderate
        } else {
            Complexity::Simple
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }
}

/// A proposed deadline with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineSuggestion {
    pub deadline: DateTime<Utc>,
    pub source: DeadlineSource,
    /// Confidence (0.0 to 1.0)
    pub confidence: f64,
    pub complexity: Complexity,
    pub reasoning: String,
}

/// Add `days` business days (Mon-Fri), keeping the time of day.
pub fn add_business_days(start: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let mut current = start;
    let mut remaining = days;
    while remaining > 0 {
        current = later(current, Duration::days(1));
        if current == DateTime::<Utc>::MAX_UTC {
            break;
        }
        if !is_weekend(current.weekday()) {
            remaining -= 1;
        }
    }
    current
}

/// `at + by`, saturating at the latest representable time.
fn later(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Move a Saturday or Sunday forward to Monday.
pub fn roll_to_weekday(at: DateTime<Utc>) -> DateTime<Utc> {
    match at.weekday() {
        Weekday::Sat => later(at, Duration::days(2)),
        Weekday::Sun => later(at, Duration::days(1)),
        _ => at,
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Earliest time expression that resolves to `now` or later.
fn earliest_mention<'a>(
    expressions: &'a [TimeExpression],
    now: DateTime<Utc>,
    default_due_hour: u32,
) -> Option<(&'a TimeExpression, DateTime<Utc>)> {
    expressions
        .iter()
        .filter_map(|expr| expr.resolve(now, default_due_hour).map(|at| (expr, at)))
        .filter(|(_, at)| *at >= now)
        .min_by_key(|(_, at)| *at)
}

/// Deadline implied by the policy alone.
pub fn policy_deadline(
    priority: Priority,
    estimated_minutes: Option<u32>,
    policy: &DeadlinePolicy,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let duration = Duration::minutes(i64::from(estimated_minutes.unwrap_or(0)));
    let lead = |hours: u32| Duration::hours(i64::from(hours.min(MAX_POLICY_HOURS)));
    match priority {
        Priority::Urgent => later(now, duration.max(lead(policy.urgent_min_hours))),
        Priority::High => later(now, duration.max(lead(policy.high_min_hours))),
        Priority::Medium => {
            add_business_days(now, policy.medium_business_days.min(MAX_POLICY_DAYS))
        }
        Priority::Low => {
            let at = later(now, Duration::days(i64::from(policy.low_days.min(MAX_POLICY_DAYS))));
            if policy.roll_weekends {
                roll_to_weekday(at)
            } else {
                at
            }
        }
    }
}

/// Suggest a deadline for a task.
///
/// `text` is only used to judge complexity; time mentions arrive already
/// detected in `expressions`.
pub fn suggest_deadline(
    text: &str,
    expressions: &[TimeExpression],
    priority: Priority,
    estimated_minutes: Option<u32>,
    policy: &DeadlinePolicy,
    now: DateTime<Utc>,
) -> DeadlineSuggestion {
    let complexity = Complexity::assess(text, estimated_minutes, &policy.complexity_indicators);

    if let Some((expr, deadline)) = earliest_mention(expressions, now, policy.default_due_hour) {
        return DeadlineSuggestion {
            deadline,
            source: DeadlineSource::ExplicitMention {
                text: expr.text.clone(),
            },
            confidence: 0.9,
            complexity,
            reasoning: format!("Explicit time mentioned: \"{}\"", expr.text),
        };
    }

    let deadline = policy_deadline(priority, estimated_minutes, policy, now);
    let rule = match priority {
        Priority::Urgent | Priority::High => {
            let min_hours = if priority == Priority::Urgent {
                policy.urgent_min_hours
            } else {
                policy.high_min_hours
            };
            format!("at least {min_hours}h or the estimated duration")
        }
        Priority::Medium => format!("{} business days", policy.medium_business_days),
        Priority::Low => format!("{} days", policy.low_days),
    };

    DeadlineSuggestion {
        deadline,
        source: DeadlineSource::PriorityPolicy,
        confidence: 0.6,
        complexity,
        reasoning: format!(
            "Based on {} priority ({}) and {} complexity",
            priority,
            rule,
            complexity.as_str()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::time_expr::detect;
    use chrono::TimeZone;

    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap()
    }

    fn policy_only(priority: Priority, minutes: Option<u32>) -> DeadlineSuggestion {
        suggest_deadline("", &[], priority, minutes, &DeadlinePolicy::default(), wednesday())
    }

    #[test]
    fn oversized_policy_is_clamped() {
        let policy = DeadlinePolicy {
            low_days: 4_000_000_000,
            medium_business_days: u32::MAX,
            urgent_min_hours: u32::MAX,
            ..DeadlinePolicy::default()
        };
        let low = policy_deadline(Priority::Low, None, &policy, wednesday());
        assert!(low >= wednesday() + Duration::days(365));
        assert!(low <= wednesday() + Duration::days(367));
        let medium = policy_deadline(Priority::Medium, None, &policy, wednesday());
        assert!(medium > wednesday() + Duration::days(365));
        let urgent = policy_deadline(Priority::Urgent, Some(u32::MAX), &policy, wednesday());
        assert!(urgent > wednesday());
    }

    #[test]
    fn near_end_of_time_saturates() {
        let end = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        let at = policy_deadline(Priority::Low, None, &DeadlinePolicy::default(), end);
        assert_eq!(at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn urgent_short_task_gets_minimum_lead() {
        let s = policy_only(Priority::Urgent, Some(30));
        assert_eq!(s.deadline, wednesday() + Duration::hours(4));
        assert_eq!(s.source, DeadlineSource::PriorityPolicy);
    }

    #[test]
    fn long_task_uses_duration() {
        let s = policy_only(Priority::High, Some(600));
        assert_eq!(s.deadline, wednesday() + Duration::minutes(600));
    }

    #[test]
    fn medium_skips_weekend() {
        let friday = Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap();
        let s = suggest_deadline("", &[], Priority::Medium, None, &DeadlinePolicy::default(), friday);
        // Mon, Tue
        assert_eq!(s.deadline, Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap());
    }

    #[test]
    fn low_rolls_to_monday() {
        let saturday_next = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let s = suggest_deadline("", &[], Priority::Low, None, &DeadlinePolicy::default(), saturday_next);
        assert_eq!(s.deadline.weekday(), Weekday::Mon);
        assert_eq!(s.deadline, Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap());
    }

    #[test]
    fn explicit_mention_wins() {
        let text = "Send the deck tomorrow at 3pm";
        let s = suggest_deadline(
            text,
            &detect(text),
            Priority::Low,
            None,
            &DeadlinePolicy::default(),
            wednesday(),
        );
        assert_eq!(s.deadline, Utc.with_ymd_and_hms(2025, 3, 6, 15, 0, 0).unwrap());
        assert!(matches!(s.source, DeadlineSource::ExplicitMention { .. }));
    }

    #[test]
    fn earliest_mention_is_used() {
        let text = "draft by friday, review tomorrow";
        let s = suggest_deadline(
            text,
            &detect(text),
            Priority::Medium,
            None,
            &DeadlinePolicy::default(),
            wednesday(),
        );
        assert_eq!(s.deadline, Utc.with_ymd_and_hms(2025, 3, 6, 17, 0, 0).unwrap());
    }

    #[test]
    fn complexity_levels() {
        let indicators = DeadlinePolicy::default().complexity_indicators;
        assert_eq!(Complexity::assess("buy milk", Some(10), &indicators), Complexity::Simple);
        assert_eq!(
            Complexity::assess("market research", None, &indicators),
            Complexity::Moderate
        );
        assert_eq!(
            Complexity::assess("research and design", None, &indicators),
            Complexity::Complex
        );
        assert_eq!(Complexity::assess("x", Some(600), &indicators), Complexity::Complex);
    }
}
