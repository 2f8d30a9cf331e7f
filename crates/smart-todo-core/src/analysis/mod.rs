//! Feature extraction from free text.
//!
//! Turns a task's text and a set of context snippets into a [`FeatureVector`]:
//! TF-IDF keywords, sentiment polarity, urgency confidence, time expressions
//! and mentions. Extraction never fails; empty input yields an empty vector.

pub mod keywords;
pub mod mentions;
pub mod sentiment;
pub mod text;
pub mod time_expr;
pub mod urgency;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::task::{ContextSnippet, Priority};

pub use keywords::Keyword;
pub use time_expr::{TimeAnchor, TimeExpression};
pub use urgency::UrgencySignal;

/// Features derived from one engine invocation's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Top keywords, highest score first
    pub keywords: Vec<Keyword>,
    /// Polarity in [-1, 1]
    pub sentiment: f64,
    /// Whether urgency confidence reached the configured threshold
    pub urgent: bool,
    /// Urgency confidence in [0, 1]
    pub urgency_confidence: f64,
    pub urgency_markers: Vec<String>,
    pub time_expressions: Vec<TimeExpression>,
    pub people: Vec<String>,
    pub projects: Vec<String>,
    pub deadline_phrases: Vec<String>,
    /// Priority label implied by wording, if any
    pub priority_hint: Option<Priority>,
}

impl FeatureVector {
    /// Keyword terms in rank order.
    pub fn keyword_terms(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.term.as_str())
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
            && self.time_expressions.is_empty()
            && self.urgency_markers.is_empty()
            && self.sentiment == 0.0
    }
}

/// Extracts features according to an engine [`Config`].
pub struct FeatureExtractor<'a> {
    config: &'a Config,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Features of the task text and the snippets together.
    ///
    /// Each non-blank input is one document for keyword IDF.
    pub fn extract(&self, task_text: Option<&str>, snippets: &[ContextSnippet]) -> FeatureVector {
        let mut documents: Vec<String> = Vec::with_capacity(snippets.len() + 1);
        if let Some(task_text) = task_text {
            documents.push(task_text.to_string());
        }
        documents.extend(snippets.iter().map(ContextSnippet::full_text));
        documents.retain(|d| !d.trim().is_empty());

        self.extract_documents(&documents)
    }

    /// Features of a single text.
    pub fn extract_text(&self, text: &str) -> FeatureVector {
        if text.trim().is_empty() {
            return FeatureVector::default();
        }
        self.extract_documents(&[text.to_string()])
    }

    fn extract_documents(&self, documents: &[String]) -> FeatureVector {
        if documents.is_empty() {
            return FeatureVector::default();
        }

        let limits = &self.config.features;
        let combined = documents.join("\n");
        let tokens = text::tokenize(&combined);

        let keywords = keywords::extract_keywords(documents, limits.top_keywords);
        let sentiment = sentiment::polarity(&combined);
        let time_expressions = time_expr::detect(&combined);
        let signal = urgency::assess(
            &combined,
            &tokens,
            &time_expressions,
            &self.config.urgency_keywords,
            self.config.scoring.time_expression_weight,
        );

        let features = FeatureVector {
            keywords,
            sentiment,
            urgent: signal.confidence > 0.0
                && signal.confidence >= self.config.scoring.urgency_threshold,
            urgency_confidence: signal.confidence,
            urgency_markers: signal.markers,
            time_expressions,
            people: mentions::people(&combined, limits.max_people),
            projects: mentions::projects(&combined, limits.max_projects),
            deadline_phrases: mentions::deadline_phrases(&combined, limits.max_deadline_phrases),
            priority_hint: urgency::priority_hint(&tokens, &self.config.priority_hints),
        };

        tracing::debug!(
            documents = documents.len(),
            keywords = features.keywords.len(),
            urgency = features.urgency_confidence,
            sentiment = features.sentiment,
            "extracted features"
        );
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::SourceType;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_input_is_neutral() {
        let cfg = Config::default();
        let extractor = FeatureExtractor::new(&cfg);
        for features in [
            extractor.extract(None, &[]),
            extractor.extract(Some("   "), &[]),
            extractor.extract_text("\n\t"),
        ] {
            assert!(features.is_empty());
            assert!(!features.urgent);
            assert_eq!(features.urgency_confidence, 0.0);
            assert_eq!(features.priority_hint, None);
        }
    }

    #[test]
    fn urgent_task_text() {
        let cfg = Config::default();
        let features = FeatureExtractor::new(&cfg).extract_text("Finish report asap");
        assert!(features.urgent);
        assert_eq!(features.priority_hint, Some(Priority::Urgent));
        assert!(features.keyword_terms().any(|t| t == "report"));
    }

    #[test]
    fn snippets_are_documents() {
        let cfg = Config::default();
        let ts = Utc.with_ymd_and_hms(2025, 3, 5, 9, 0, 0).unwrap();
        let snippets = vec![
            ContextSnippet::new("Budget numbers look wrong", SourceType::Email, ts)
                .with_subject("Q3 budget"),
            ContextSnippet::new("Ask @lee about budget tomorrow", SourceType::Message, ts),
        ];
        let features = FeatureExtractor::new(&cfg).extract(Some("Review budget"), &snippets);
        assert_eq!(features.keywords[0].term, "budget");
        assert_eq!(features.people, vec!["lee"]);
        assert_eq!(features.time_expressions.len(), 1);
        assert!(features.sentiment < 0.0);
    }
}
