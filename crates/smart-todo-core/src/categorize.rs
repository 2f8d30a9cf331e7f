//! Category and tag suggestion.
//!
//! Extracted keywords are matched against the configured keyword tables
//! (category -> keyword -> weight). Scoring per category:
//! - matched weight = sum of weights of table keywords present among the
//!   extracted keywords (plural forms count)
//! - confidence = matched weight / total weight of that category's table
//!
//! The category with the highest matched weight wins; ties go to the name
//! that sorts first. No overlap at all is a valid outcome with confidence 0.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::text::term_matches;
use crate::analysis::FeatureVector;

const MAX_ALTERNATIVES: usize = 3;
const MAX_TAGS: usize = 5;

/// One category that overlapped the extracted keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub category: String,
    /// Confidence (0.0 to 1.0)
    pub confidence: f64,
    pub matched_weight: f64,
    /// Table keywords that were found
    pub matched_keywords: Vec<String>,
}

/// Suggested category and tags for a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    /// `None` when no category keyword overlapped
    pub category: Option<String>,
    /// Confidence (0.0 to 1.0)
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    /// Runner-up categories, best first
    pub alternatives: Vec<CategoryMatch>,
    /// Top keywords not already present as tags
    pub suggested_tags: Vec<String>,
}

/// Match one category table against the extracted keyword terms.
fn match_category(
    category: &str,
    table: &BTreeMap<String, f64>,
    terms: &[&str],
) -> Option<CategoryMatch> {
    let total: f64 = table.values().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }

    let mut matched_weight = 0.0;
    let mut matched_keywords = Vec::new();
    for (keyword, weight) in table {
        if !weight.is_finite() || *weight <= 0.0 {
            continue;
        }
        let keyword = keyword.to_lowercase();
        if terms.iter().any(|term| term_matches(term, &keyword)) {
            matched_weight += weight;
            matched_keywords.push(keyword);
        }
    }

    if matched_weight <= 0.0 {
        return None;
    }

    Some(CategoryMatch {
        category: category.to_string(),
        confidence: (matched_weight / total).clamp(0.0, 1.0),
        matched_weight,
        matched_keywords,
    })
}

/// Suggest a category from extracted features.
///
/// `existing_tags` are excluded from the suggested tags.
pub fn suggest_category(
    features: &FeatureVector,
    tables: &BTreeMap<String, BTreeMap<String, f64>>,
    existing_tags: &BTreeSet<String>,
) -> CategorySuggestion {
    let terms: Vec<&str> = features.keyword_terms().collect();

    // BTreeMap iteration is lexical, and the sort is stable, so equal weights
    // keep name order.
    let mut matches: Vec<CategoryMatch> = tables
        .iter()
        .filter_map(|(category, table)| match_category(category, table, &terms))
        .collect();
    matches.sort_by(|a, b| b.matched_weight.total_cmp(&a.matched_weight));

    let suggested_tags = terms
        .iter()
        .filter(|term| {
            !existing_tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(term))
        })
        .take(MAX_TAGS)
        .map(|term| term.to_string())
        .collect();

    let mut ranked = matches.into_iter();
    match ranked.next() {
        Some(best) => CategorySuggestion {
            category: Some(best.category),
            confidence: best.confidence,
            matched_keywords: best.matched_keywords,
            alternatives: ranked.take(MAX_ALTERNATIVES).collect(),
            suggested_tags,
        },
        None => CategorySuggestion {
            suggested_tags,
            ..CategorySuggestion::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FeatureExtractor;
    use crate::config::Config;

    fn suggest(text: &str) -> CategorySuggestion {
        let cfg = Config::default();
        let features = FeatureExtractor::new(&cfg).extract_text(text);
        suggest_category(&features, &cfg.categories, &BTreeSet::new())
    }

    #[test]
    fn picks_highest_overlap() {
        let s = suggest("Prepare the client presentation for the project meeting");
        assert_eq!(s.category.as_deref(), Some("work"));
        // 4 of 6 work keywords, all weighted 1.0
        assert!((s.confidence - 4.0 / 6.0).abs() < 1e-9);
        assert_eq!(s.matched_keywords.len(), 4);
    }

    #[test]
    fn plural_forms_match() {
        let s = suggest("pay the bills");
        assert_eq!(s.category.as_deref(), Some("finance"));
    }

    #[test]
    fn no_overlap_is_none() {
        let s = suggest("zzz qqq");
        assert_eq!(s.category, None);
        assert_eq!(s.confidence, 0.0);
        assert!(s.alternatives.is_empty());
    }

    #[test]
    fn ties_break_lexically() {
        let mut tables = BTreeMap::new();
        tables.insert("zeta".to_string(), BTreeMap::from([("alpha".to_string(), 1.0)]));
        tables.insert("beta".to_string(), BTreeMap::from([("alpha".to_string(), 1.0)]));
        let cfg = Config::default();
        let features = FeatureExtractor::new(&cfg).extract_text("alpha");
        let s = suggest_category(&features, &tables, &BTreeSet::new());
        assert_eq!(s.category.as_deref(), Some("beta"));
        assert_eq!(s.alternatives[0].category, "zeta");
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn alternatives_and_tags() {
        let cfg = Config::default();
        let features =
            FeatureExtractor::new(&cfg).extract_text("Book a flight and pay the hotel bill");
        let tags = BTreeSet::from(["flight".to_string()]);
        let s = suggest_category(&features, &cfg.categories, &tags);
        assert_eq!(s.category.as_deref(), Some("travel"));
        assert!(s.alternatives.iter().any(|a| a.category == "finance"));
        assert!(!s.suggested_tags.contains(&"flight".to_string()));
        assert!(s.suggested_tags.contains(&"hotel".to_string()));
    }
}
