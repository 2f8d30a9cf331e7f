//! TF-IDF keyword extraction.
//!
//! Every input text is one document. Term frequency is counted over the whole
//! corpus and weighted by a smoothed inverse document frequency, so terms that
//! recur across many snippets rank below terms specific to a few of them,
//! while a single document still produces non-zero scores.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::text::content_tokens;

/// A ranked keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub score: f64,
}

struct TermStats {
    count: usize,
    doc_freq: usize,
    first_seen: usize,
    last_doc: usize,
}

/// Extract the `top_n` highest-scoring terms across `documents`.
///
/// Ties are broken by first occurrence.
pub fn extract_keywords<S: AsRef<str>>(documents: &[S], top_n: usize) -> Vec<Keyword> {
    let mut stats: HashMap<String, TermStats> = HashMap::new();
    let mut total_tokens = 0usize;
    let mut position = 0usize;
    let mut doc_count = 0usize;

    for (doc_index, doc) in documents.iter().enumerate() {
        let tokens = content_tokens(doc.as_ref());
        if tokens.is_empty() {
            continue;
        }
        doc_count += 1;
        for token in tokens {
            total_tokens += 1;
            let entry = stats.entry(token).or_insert(TermStats {
                count: 0,
                doc_freq: 0,
                first_seen: position,
                last_doc: usize::MAX,
            });
            entry.count += 1;
            if entry.last_doc != doc_index {
                entry.doc_freq += 1;
                entry.last_doc = doc_index;
            }
            position += 1;
        }
    }

    if total_tokens == 0 || top_n == 0 {
        return Vec::new();
    }

    let n = doc_count as f64;
    let mut scored: Vec<(String, f64, usize)> = stats
        .into_iter()
        .map(|(term, s)| {
            let tf = s.count as f64 / total_tokens as f64;
            let idf = ((1.0 + n) / (1.0 + s.doc_freq as f64)).ln() + 1.0;
            (term, tf * idf, s.first_seen)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.2.cmp(&b.2)));

    scored
        .into_iter()
        .take(top_n)
        .map(|(term, score, _)| Keyword { term, score })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(keywords: &[Keyword]) -> Vec<&str> {
        keywords.iter().map(|k| k.term.as_str()).collect()
    }

    #[test]
    fn empty_input_has_no_keywords() {
        assert!(extract_keywords::<&str>(&[], 10).is_empty());
        assert!(extract_keywords(&["   ", "the and of"], 10).is_empty());
    }

    #[test]
    fn frequent_terms_rank_first() {
        let docs = ["budget review budget meeting", "budget numbers"];
        let keywords = extract_keywords(&docs, 10);
        assert_eq!(keywords[0].term, "budget");
    }

    #[test]
    fn document_specific_terms_outrank_ubiquitous_ones() {
        // "report" occurs once in every document, "invoice" twice in one.
        let docs = ["report invoice invoice", "report", "report"];
        let keywords = extract_keywords(&docs, 10);
        assert_eq!(terms(&keywords), vec!["invoice", "report"]);
    }

    #[test]
    fn ties_keep_first_occurrence_order() {
        let keywords = extract_keywords(&["zebra apple mango"], 10);
        assert_eq!(terms(&keywords), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn top_n_limits_output() {
        let keywords = extract_keywords(&["one two three four five six"], 3);
        assert_eq!(keywords.len(), 3);
    }
}
