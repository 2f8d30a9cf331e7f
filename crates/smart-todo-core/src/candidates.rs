//! Candidate task extraction from context snippets.
//!
//! Each sentence of each snippet yields at most one candidate, from the
//! first pattern that matches:
//! - labelled markers ("todo: ...", "urgent - ...", "tomorrow: ...")
//! - action phrases ("need to ...", "don't forget to ...", "let's ...")
//! - imperative sentences starting with a known action verb
//!
//! Confidence = pattern base + 0.25 x keyword strength + 0.15 x urgency,
//! clamped to [0, 1]. Keyword strength is the share of the candidate's
//! content words that rank among the context's top keywords.

use chrono::{DateTime, Utc};
use indoc::{formatdoc, indoc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::analysis::text::{capitalize_first, content_tokens, is_stop_word, sentences, tokenize};
use crate::analysis::{time_expr, urgency, FeatureExtractor, Keyword};
use crate::categorize::suggest_category;
use crate::config::Config;
use crate::generator::Prompt;
use crate::task::{ContextSnippet, Priority};

const MAX_TITLE_CHARS: usize = 120;
const KEYWORD_WEIGHT: f64 = 0.25;
const URGENCY_WEIGHT: f64 = 0.15;

const ACTION_VERBS: &[&str] = &[
    "arrange", "ask", "book", "buy", "call", "cancel", "check", "clean", "complete", "confirm",
    "contact", "draft", "email", "file", "finalize", "finish", "fix", "follow", "meet", "order",
    "organize", "pay", "pick", "plan", "prepare", "remind", "renew", "reply", "respond", "review",
    "schedule", "send", "share", "submit", "update", "write",
];

/// An unconfirmed task inferred from context text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTask {
    pub title: String,
    /// Why the candidate was proposed
    pub rationale: String,
    /// Confidence (0.0 to 1.0)
    pub confidence: f64,
    pub suggested_category: Option<String>,
    pub suggested_priority: Priority,
    /// Index of the snippet the candidate came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<usize>,
    /// Timestamp of that snippet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    Labelled,
    ActionPhrase,
    Imperative,
}

impl PatternKind {
    fn base_confidence(self) -> f64 {
        match self {
            PatternKind::Labelled => 0.6,
            PatternKind::ActionPhrase => 0.55,
            PatternKind::Imperative => 0.45,
        }
    }
}

struct Patterns {
    labelled: Regex,
    action_phrase: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |pattern: &str| Regex::new(pattern).expect("static regex must compile");
        Patterns {
            labelled: build(
                r"(?i)\b(action items?|todo|to-do|task|reminder|urgent|asap|important|today|tomorrow|tonight)\s*[:\-]\s*(.+)",
            ),
            action_phrase: build(
                r"(?i)\b(needs? to|should|ha(?:ve|s) to|must|remember to|don['’]t forget to|do not forget to|please|let['’]?s|let us)\s+(.+)",
            ),
        }
    })
}

/// Match one sentence against the candidate patterns.
fn match_sentence(sentence: &str) -> Option<(PatternKind, String, String)> {
    let p = patterns();
    if let Some(caps) = p.labelled.captures(sentence) {
        return Some((PatternKind::Labelled, caps[1].to_lowercase(), caps[2].to_string()));
    }
    if let Some(caps) = p.action_phrase.captures(sentence) {
        let rest = caps[2].to_string();
        let starts_with_content = tokenize(&rest)
            .first()
            .is_some_and(|first| !is_stop_word(first));
        if starts_with_content {
            let trigger = caps[1].to_lowercase().replace('’', "'");
            return Some((PatternKind::ActionPhrase, trigger, rest));
        }
    }
    let first = tokenize(sentence).into_iter().next()?;
    if ACTION_VERBS.contains(&first.as_str()) {
        return Some((PatternKind::Imperative, first, sentence.to_string()));
    }
    None
}

/// Normalize a matched phrase into a title.
fn clean_title(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | ';' | '-'));
    let title: String = trimmed.chars().take(MAX_TITLE_CHARS).collect();
    capitalize_first(title.trim_end())
}

fn keyword_strength(title: &str, keywords: &HashSet<&str>) -> f64 {
    let words = content_tokens(title);
    if words.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|w| keywords.contains(w.as_str())).count();
    hits as f64 / words.len() as f64
}

/// Order by confidence (desc), then snippet recency (newer first), then
/// insertion order.
pub fn rank(candidates: &mut [CandidateTask]) {
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
            .then_with(|| match (a.source_index, b.source_index) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            })
    });
}

/// Drop case-insensitive duplicate titles, keeping the first occurrence.
pub fn dedup(candidates: &mut Vec<CandidateTask>) {
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.title.to_lowercase()));
}

/// Scan `snippets` for actionable phrases.
///
/// `keywords` are the top keywords of the whole context.
pub fn extract_candidates(
    snippets: &[ContextSnippet],
    keywords: &[Keyword],
    config: &Config,
) -> Vec<CandidateTask> {
    let top: HashSet<&str> = keywords.iter().map(|k| k.term.as_str()).collect();
    let extractor = FeatureExtractor::new(config);
    let mut candidates = Vec::new();

    for (index, snippet) in snippets.iter().enumerate() {
        for sentence in sentences(snippet.text()) {
            let Some((kind, trigger, phrase)) = match_sentence(sentence) else {
                continue;
            };
            let title = clean_title(&phrase);
            if title.chars().count() < config.features.min_candidate_len {
                continue;
            }

            let tokens = tokenize(sentence);
            let signal = urgency::assess(
                sentence,
                &tokens,
                &time_expr::detect(sentence),
                &config.urgency_keywords,
                config.scoring.time_expression_weight,
            );
            let confidence = (kind.base_confidence()
                + KEYWORD_WEIGHT * keyword_strength(&title, &top)
                + URGENCY_WEIGHT * signal.confidence)
                .clamp(0.0, 1.0);

            let features = extractor.extract_text(&title);
            let category = suggest_category(&features, &config.categories, &Default::default());
            let suggested_priority = urgency::priority_hint(&tokens, &config.priority_hints)
                .unwrap_or(if signal.confidence >= config.scoring.urgency_threshold {
                    Priority::High
                } else {
                    Priority::Medium
                });

            let rationale = match kind {
                PatternKind::Imperative => {
                    format!("Imperative \"{trigger}\" in {}", snippet.source())
                }
                _ => format!("Found \"{trigger}\" in {}", snippet.source()),
            };

            candidates.push(CandidateTask {
                title,
                rationale,
                confidence,
                suggested_category: category.category,
                suggested_priority,
                source_index: Some(index),
                timestamp: snippet.timestamp(),
            });
        }
    }

    rank(&mut candidates);
    dedup(&mut candidates);
    candidates.truncate(config.features.max_candidates);
    tracing::debug!(count = candidates.len(), "extracted candidate tasks");
    candidates
}

/// Prompt asking a generator for task suggestions, one per line.
pub fn prompt(snippets: &[ContextSnippet], max: usize) -> Prompt {
    let system = indoc! {"
        You turn a person's messages, emails and notes into todo items.
        Answer with one short actionable task per line and nothing else."};
    let context: Vec<String> = snippets
        .iter()
        .map(|s| format!("- [{}] {}", s.source(), s.full_text()))
        .collect();
    let user = formatdoc! {"
        Suggest at most {max} tasks for this context:
        {context}",
        context = context.join("\n"),
    };
    Prompt::new(system, user)
}

/// Parse a generator answer into candidates, one per non-empty line.
///
/// List markers ("1.", "-", "*") are stripped.
pub fn parse_generated(text: &str, config: &Config) -> Vec<CandidateTask> {
    let extractor = FeatureExtractor::new(config);
    let mut candidates: Vec<CandidateTask> = text
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*'))
                .trim()
        })
        .map(clean_title)
        .filter(|title| title.chars().count() >= config.features.min_candidate_len)
        .map(|title| {
            let features = extractor.extract_text(&title);
            let category = suggest_category(&features, &config.categories, &Default::default());
            CandidateTask {
                suggested_priority: features.priority_hint.unwrap_or_default(),
                suggested_category: category.category,
                rationale: "Suggested by generator".to_string(),
                confidence: 0.7,
                source_index: None,
                timestamp: None,
                title,
            }
        })
        .collect();
    dedup(&mut candidates);
    candidates.truncate(config.features.max_candidates);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::SourceType;
    use chrono::{Duration, TimeZone};

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, hour, 0, 0).unwrap()
    }

    fn extract(snippets: &[ContextSnippet]) -> Vec<CandidateTask> {
        let cfg = Config::default();
        extract_candidates(snippets, &[], &cfg)
    }

    #[test]
    fn lets_phrase_becomes_candidate() {
        let snippets = vec![ContextSnippet::new(
            "Let's meet tomorrow at 3pm to discuss budget",
            SourceType::Message,
            ts(9),
        )];
        let found = extract(&snippets);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Meet tomorrow at 3pm to discuss budget");
        assert_eq!(found[0].source_index, Some(0));
    }

    #[test]
    fn labelled_and_imperative() {
        let snippets = vec![ContextSnippet::new(
            "TODO: renew passport. Call the dentist about Friday. Nice weather today.",
            SourceType::Note,
            ts(9),
        )];
        let titles: Vec<String> = extract(&snippets).into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["Renew passport", "Call the dentist about Friday"]);
    }

    #[test]
    fn filler_after_trigger_is_ignored() {
        let snippets = vec![ContextSnippet::new("It should be fine", SourceType::Note, ts(9))];
        assert!(extract(&snippets).is_empty());
    }

    #[test]
    fn short_and_duplicate_candidates_dropped() {
        let snippets = vec![
            ContextSnippet::new("todo: eat", SourceType::Note, ts(9)),
            ContextSnippet::new("Please send the invoice", SourceType::Email, ts(9)),
            ContextSnippet::new("please SEND THE INVOICE", SourceType::Email, ts(8)),
        ];
        let found = extract(&snippets);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_index, Some(1));
    }

    #[test]
    fn urgency_raises_confidence() {
        let snippets = vec![
            ContextSnippet::new("Need to water the plants", SourceType::Note, ts(9)),
            ContextSnippet::new("Need to fix the server asap", SourceType::Note, ts(9)),
        ];
        let found = extract(&snippets);
        assert_eq!(found[0].title, "Fix the server asap");
        assert!(found[0].confidence > found[1].confidence);
        assert_eq!(found[0].suggested_priority, Priority::Urgent);
    }

    #[test]
    fn ties_prefer_newer_then_insertion_order() {
        let snippets = vec![
            ContextSnippet::new("Need to book flights", SourceType::Note, ts(8)),
            ContextSnippet::new("Need to renew lease", SourceType::Note, ts(9)),
            ContextSnippet::new("Need to order paint", SourceType::Note, ts(9)),
        ];
        let found = extract(&snippets);
        let order: Vec<Option<usize>> = found.iter().map(|c| c.source_index).collect();
        assert_eq!(order, vec![Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn rank_is_descending() {
        let mut list = vec![
            CandidateTask {
                title: "a".into(),
                rationale: String::new(),
                confidence: 0.2,
                suggested_category: None,
                suggested_priority: Priority::Low,
                source_index: Some(0),
                timestamp: Some(ts(9)),
            },
            CandidateTask {
                title: "b".into(),
                rationale: String::new(),
                confidence: 0.9,
                suggested_category: None,
                suggested_priority: Priority::Low,
                source_index: Some(1),
                timestamp: Some(ts(9) - Duration::hours(1)),
            },
        ];
        rank(&mut list);
        assert_eq!(list[0].title, "b");
    }

    #[test]
    fn parses_generated_lines() {
        let cfg = Config::default();
        let found = parse_generated("1. Book the hotel\n- Pay the electricity bill\n\n* ok\n", &cfg);
        let titles: Vec<&str> = found.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Book the hotel", "Pay the electricity bill"]);
        assert_eq!(found[1].suggested_category.as_deref(), Some("finance"));
    }
}
