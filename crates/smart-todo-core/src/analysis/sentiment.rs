//! Lexicon-based sentiment polarity.
//!
//! Polarity is the sum of word weights divided by the token count, clamped
//! to [-1, 1]. A negator directly before a word (or one word before it)
//! flips and halves its weight; an intensifier scales it up.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::text::tokenize;

const LEXICON: &[(&str, f64)] = &[
    // positive
    ("appreciate", 0.6),
    ("awesome", 0.9),
    ("excellent", 1.0),
    ("excited", 0.7),
    ("glad", 0.7),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("love", 0.8),
    ("nice", 0.6),
    ("perfect", 1.0),
    ("pleased", 0.7),
    ("success", 0.7),
    ("successful", 0.7),
    ("thank", 0.5),
    ("thanks", 0.5),
    ("wonderful", 0.9),
    // negative
    ("angry", -0.8),
    ("annoyed", -0.6),
    ("awful", -1.0),
    ("bad", -0.7),
    ("behind", -0.3),
    ("broken", -0.6),
    ("complaint", -0.6),
    ("crisis", -0.9),
    ("delay", -0.5),
    ("delayed", -0.5),
    ("disappointed", -0.7),
    ("fail", -0.7),
    ("failed", -0.7),
    ("failure", -0.8),
    ("frustrated", -0.8),
    ("issue", -0.4),
    ("late", -0.4),
    ("missed", -0.5),
    ("overdue", -0.5),
    ("problem", -0.5),
    ("sorry", -0.3),
    ("stress", -0.6),
    ("stressed", -0.7),
    ("terrible", -1.0),
    ("unfortunately", -0.5),
    ("upset", -0.7),
    ("worried", -0.6),
    ("wrong", -0.6),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't", "won't",
    "can't", "cannot", "hardly",
];

const INTENSIFIERS: &[&str] = &["very", "really", "extremely", "so", "super", "totally"];

fn lexicon() -> &'static HashMap<&'static str, f64> {
    static MAP: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    MAP.get_or_init(|| LEXICON.iter().copied().collect())
}

/// Polarity of `text` in [-1, 1]; 0.0 for empty text.
pub fn polarity(text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    for (i, token) in tokens.iter().enumerate() {
        let Some(&weight) = lexicon().get(token.as_str()) else {
            continue;
        };
        let before = |offset: usize| i.checked_sub(offset).map(|j| tokens[j].as_str());

        let mut weight = weight;
        if before(1).is_some_and(|t| INTENSIFIERS.contains(&t)) {
            weight *= 1.3;
        }
        let negated = [before(1), before(2)]
            .into_iter()
            .flatten()
            .any(|t| NEGATORS.contains(&t));
        if negated {
            weight *= -0.5;
        }
        total += weight;
    }

    let score = total / tokens.len() as f64;
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_neutral() {
        assert_eq!(polarity(""), 0.0);
        assert_eq!(polarity("   \n"), 0.0);
    }

    #[test]
    fn sign_follows_lexicon() {
        assert!(polarity("great work, thanks") > 0.0);
        assert!(polarity("the build is broken and late") < 0.0);
        assert_eq!(polarity("send the invoice"), 0.0);
    }

    #[test]
    fn negation_flips() {
        assert!(polarity("this is not good") < 0.0);
        assert!(polarity("no problem at all") > 0.0);
    }

    #[test]
    fn always_within_range() {
        let p = polarity("terrible awful terrible");
        assert!((-1.0..=1.0).contains(&p));
    }
}
