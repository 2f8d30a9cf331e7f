//! Property tests for the engine's range and ordering invariants.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use smart_todo_core::analysis::sentiment::polarity;
use smart_todo_core::candidates::rank;
use smart_todo_core::deadline::suggest_deadline;
use smart_todo_core::scoring::deadline_proximity_factor;
use smart_todo_core::{
    CandidateTask, Config, ContextSnippet, FeatureExtractor, Priority, SourceType,
    SuggestionEngine, TaskDescriptor,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 5, 10, 0, 0).unwrap()
}

fn priority() -> impl Strategy<Value = Option<Priority>> {
    prop_oneof![
        Just(None),
        Just(Some(Priority::Low)),
        Just(Some(Priority::Medium)),
        Just(Some(Priority::High)),
        Just(Some(Priority::Urgent)),
    ]
}

const WORDS: &[&str] = &[
    "asap", "urgent", "report", "budget", "tomorrow", "friday", "need", "to", "call", "bank",
    "great", "terrible", "not", "meeting", "at", "3pm", "in", "2", "days", "today", "deadline",
];

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..12).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn test_extraction_never_panics(text in ".{0,200}") {
        let config = Config::default();
        let features = FeatureExtractor::new(&config).extract_text(&text);
        prop_assert!((0.0..=1.0).contains(&features.urgency_confidence));
        prop_assert!((-1.0..=1.0).contains(&features.sentiment));
        if text.trim().is_empty() {
            prop_assert!(features.is_empty());
        }
    }

    #[test]
    fn test_polarity_in_range(text in sentence()) {
        let p = polarity(&text);
        prop_assert!((-1.0..=1.0).contains(&p));
    }

    #[test]
    fn test_score_in_range(
        priority in priority(),
        offset_hours in proptest::option::of(-500i64..2000),
        title in sentence(),
    ) {
        let mut task = TaskDescriptor::new(title);
        task.priority = priority;
        task.deadline = offset_hours.map(|h| now() + Duration::hours(h));
        let engine = SuggestionEngine::new(Config::default());
        let a = engine.score_priority(&task, &[], now()).unwrap();
        prop_assert!((0.0..=1.0).contains(&a.priority_score));
        prop_assert!(!a.priority_score.is_nan());
    }

    #[test]
    fn test_proximity_in_range(offset_hours in -1000i64..5000, horizon in -5.0f64..60.0) {
        let f = deadline_proximity_factor(Some(now() + Duration::hours(offset_hours)), now(), horizon);
        prop_assert!((0.0..=1.0).contains(&f));
    }

    #[test]
    fn test_category_confidence_bounds(text in sentence()) {
        let engine = SuggestionEngine::new(Config::default());
        let s = engine.categorize(&TaskDescriptor::new(text), &[]).unwrap();
        prop_assert!((0.0..=1.0).contains(&s.confidence));
        prop_assert_eq!(s.confidence == 0.0, s.category.is_none());
    }

    #[test]
    fn test_urgent_deadline_within_minimum_lead(minutes in 0u32..=240) {
        let policy = Config::default().deadline;
        let s = suggest_deadline("", &[], Priority::Urgent, Some(minutes), &policy, now());
        prop_assert!(s.deadline >= now());
        prop_assert!(s.deadline <= now() + Duration::hours(4));
    }

    #[test]
    fn test_candidates_sorted_descending(texts in prop::collection::vec(sentence(), 0..8)) {
        let snippets: Vec<ContextSnippet> = texts
            .iter()
            .map(|t| ContextSnippet::new(t.clone(), SourceType::Message, now()))
            .collect();
        let engine = SuggestionEngine::new(Config::default());
        let found = engine.candidate_tasks(&snippets);
        for pair in found.windows(2) {
            prop_assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn test_equal_ties_keep_insertion_order(n in 1usize..10) {
        let mut list: Vec<CandidateTask> = (0..n)
            .map(|i| CandidateTask {
                title: format!("candidate {i}"),
                rationale: String::new(),
                confidence: 0.5,
                suggested_category: None,
                suggested_priority: Priority::Medium,
                source_index: Some(i),
                timestamp: Some(now()),
            })
            .collect();
        list.reverse();
        rank(&mut list);
        let order: Vec<usize> = list.iter().filter_map(|c| c.source_index).collect();
        prop_assert_eq!(order, (0..n).collect::<Vec<_>>());
    }
}
