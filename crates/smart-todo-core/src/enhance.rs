//! Description enhancement.
//!
//! The local path is plain templating: the original description (or a
//! starter step list when there is none), the dominant keywords, a one-line
//! urgency summary and up to two context sentences that share words with
//! the task.

use indoc::{formatdoc, indoc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::analysis::text::{content_tokens, sentences};
use crate::analysis::FeatureVector;
use crate::generator::Prompt;
use crate::task::{ContextSnippet, TaskDescriptor};

const MAX_TOPICS: usize = 5;
const MAX_CONTEXT_NOTES: usize = 2;

/// Who wrote the enhanced description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementSource {
    Template,
    Generator,
}

/// An augmented task description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    pub enhanced_description: String,
    pub source: EnhancementSource,
    /// Context sentences folded into the description
    pub added_context: Vec<String>,
    /// Confidence (0.0 to 1.0)
    pub confidence: f64,
}

impl Enhancement {
    /// Wrap a generator response, used verbatim.
    pub fn generated(text: String) -> Self {
        Self {
            enhanced_description: text,
            source: EnhancementSource::Generator,
            added_context: Vec::new(),
            confidence: 0.8,
        }
    }
}

/// Sentences from `snippets` sharing at least one content word with the task.
pub fn relevant_sentences(task: &TaskDescriptor, snippets: &[ContextSnippet]) -> Vec<String> {
    let task_words: HashSet<String> = content_tokens(&task.text()).into_iter().collect();
    if task_words.is_empty() {
        return Vec::new();
    }
    let own_text = task.text().to_lowercase();

    let mut notes: Vec<String> = Vec::new();
    for snippet in snippets {
        for sentence in sentences(snippet.text()) {
            if notes.len() >= MAX_CONTEXT_NOTES {
                return notes;
            }
            let shares_word = content_tokens(sentence)
                .iter()
                .any(|word| task_words.contains(word));
            let lowered = sentence.to_lowercase();
            if shares_word
                && !own_text.contains(&lowered)
                && !notes.iter().any(|n| n.to_lowercase() == lowered)
            {
                notes.push(sentence.to_string());
            }
        }
    }
    notes
}

/// One-line urgency summary.
pub fn urgency_summary(features: &FeatureVector) -> String {
    if features.urgent {
        format!(
            "Urgency: high ({})",
            features.urgency_markers.join(", ")
        )
    } else if features.urgency_confidence > 0.0 {
        format!(
            "Urgency: moderate ({})",
            features.urgency_markers.join(", ")
        )
    } else {
        "Urgency: none detected".to_string()
    }
}

/// Build the description from the local template.
pub fn template(
    task: &TaskDescriptor,
    features: &FeatureVector,
    snippets: &[ContextSnippet],
) -> Enhancement {
    let mut body = match task.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => description.to_string(),
        _ => formatdoc! {"
            Task: {title}

            Suggested steps:
            1. Plan the approach
            2. Execute the task
            3. Review and finalize",
            title = task.title.trim(),
        },
    };

    let topics: Vec<&str> = features.keyword_terms().take(MAX_TOPICS).collect();
    if !topics.is_empty() {
        body.push_str(&format!("\n\nKey topics: {}", topics.join(", ")));
    }
    body.push_str(&format!("\n{}", urgency_summary(features)));

    let added_context = relevant_sentences(task, snippets);
    if !added_context.is_empty() {
        body.push_str("\n\nContext notes:");
        for note in &added_context {
            body.push_str(&format!("\n- {note}"));
        }
    }

    let confidence = if added_context.is_empty() { 0.5 } else { 0.6 };
    Enhancement {
        enhanced_description: body,
        source: EnhancementSource::Template,
        added_context,
        confidence,
    }
}

/// Prompt asking a generator for an improved description.
pub fn prompt(task: &TaskDescriptor, snippets: &[ContextSnippet]) -> Prompt {
    let system = indoc! {"
        You improve task descriptions for a personal todo list.
        Rewrite the description so it is clear and actionable.
        Keep it under 120 words. Answer with the description only."};

    let description = task.description.as_deref().unwrap_or("(none)");
    let context: Vec<String> = snippets
        .iter()
        .map(|s| format!("- [{}] {}", s.source(), s.full_text()))
        .collect();
    let context = if context.is_empty() {
        "(none)".to_string()
    } else {
        context.join("\n")
    };

    let user = formatdoc! {"
        Title: {title}
        Description: {description}
        Context:
        {context}",
        title = task.title,
    };
    Prompt::new(system, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FeatureExtractor;
    use crate::config::Config;
    use crate::task::SourceType;
    use chrono::{TimeZone, Utc};

    fn snippet(text: &str) -> ContextSnippet {
        let ts = Utc.with_ymd_and_hms(2025, 3, 5, 9, 0, 0).unwrap();
        ContextSnippet::new(text, SourceType::Note, ts)
    }

    #[test]
    fn empty_description_gets_steps() {
        let cfg = Config::default();
        let task = TaskDescriptor::new("Plan offsite");
        let features = FeatureExtractor::new(&cfg).extract_text(&task.text());
        let e = template(&task, &features, &[]);
        assert!(e.enhanced_description.starts_with("Task: Plan offsite\n\nSuggested steps:\n1."));
        assert!(e.enhanced_description.contains("Key topics: "));
        assert!(e.enhanced_description.ends_with("Urgency: none detected"));
        assert_eq!(e.source, EnhancementSource::Template);
    }

    #[test]
    fn keeps_description_and_adds_context() {
        let cfg = Config::default();
        let task = TaskDescriptor::new("Finish report asap").with_description("Quarterly numbers");
        let snippets = vec![
            snippet("The report template changed. Lunch at noon."),
            snippet("Numbers from finance arrive today"),
        ];
        let features = FeatureExtractor::new(&cfg).extract(Some(&task.text()), &snippets);
        let e = template(&task, &features, &snippets);
        assert!(e.enhanced_description.starts_with("Quarterly numbers"));
        assert!(e.enhanced_description.contains("Urgency: high (asap"));
        assert_eq!(
            e.added_context,
            vec!["The report template changed", "Numbers from finance arrive today"]
        );
    }

    #[test]
    fn prompt_includes_context() {
        let task = TaskDescriptor::new("Call plumber");
        let p = prompt(&task, &[snippet("sink is leaking")]);
        assert!(p.user.contains("Title: Call plumber"));
        assert!(p.user.contains("- [note] sink is leaking"));
        assert!(p.system.ends_with("description only."));
    }
}
