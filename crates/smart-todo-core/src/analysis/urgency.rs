//! Urgency confidence and priority hints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::text::term_matches;
use super::time_expr::TimeExpression;
use crate::config::PriorityHints;
use crate::task::Priority;

/// How strongly a text signals time pressure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrgencySignal {
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Keywords and time expressions that contributed, in order found
    pub markers: Vec<String>,
}

/// Combine urgency keywords and time expressions into a capped confidence.
///
/// Each distinct keyword contributes its configured weight once; multi-word
/// keywords are matched against the lowercased text. Every time expression
/// contributes `time_weight`.
pub fn assess(
    text: &str,
    tokens: &[String],
    time_expressions: &[TimeExpression],
    keywords: &BTreeMap<String, f64>,
    time_weight: f64,
) -> UrgencySignal {
    let lowered = text.to_lowercase();
    let mut confidence = 0.0;
    let mut markers = Vec::new();

    for (keyword, weight) in keywords {
        let found = if keyword.contains(' ') {
            lowered.contains(keyword.as_str())
        } else {
            tokens.iter().any(|t| term_matches(t, keyword))
        };
        if found {
            confidence += weight;
            markers.push(keyword.clone());
        }
    }

    for expr in time_expressions {
        confidence += time_weight;
        markers.push(expr.text.clone());
    }

    let confidence = if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    UrgencySignal { confidence, markers }
}

/// Highest priority label whose hint words appear in `tokens`.
pub fn priority_hint(tokens: &[String], hints: &PriorityHints) -> Option<Priority> {
    let levels = [
        (Priority::Urgent, &hints.urgent),
        (Priority::High, &hints.high),
        (Priority::Medium, &hints.medium),
        (Priority::Low, &hints.low),
    ];
    levels
        .into_iter()
        .find(|(_, words)| {
            words
                .iter()
                .any(|w| tokens.iter().any(|t| term_matches(t, &w.to_lowercase())))
        })
        .map(|(priority, _)| priority)
}
