//! People, project and deadline-phrase mentions.

use regex::Regex;
use std::sync::OnceLock;

use super::text::is_stop_word;

struct Patterns {
    at_mention: Regex,
    named_person: Regex,
    project_after: Regex,
    project_before: Regex,
    hashtag: Regex,
    deadline_phrase: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |pattern: &str| Regex::new(pattern).expect("static regex must compile");
        Patterns {
            at_mention: build(r"@(\w+)"),
            // Names are capitalized; the verb before them may be either case.
            named_person: build(
                r"\b(?:[Ff]rom|[Ww]ith|[Cc]ontact|[Cc]all|[Ee]mail|[Aa]sk|[Tt]ell|[Rr]emind)\s+([A-Z][a-z]+)\b",
            ),
            project_after: build(r"(?i)\bproject\s+([a-z0-9][\w-]*)"),
            project_before: build(r"(?i)\b([a-z0-9][\w-]*)\s+project\b"),
            hashtag: build(r"#(\w+)"),
            deadline_phrase: build(r"(?i)\b(?:due|deadline|by|before|until)\s*:?\s+([^.!?\n;]+)"),
        }
    })
}

const NOT_NAMES: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "today",
    "tomorrow", "tonight", "january", "february", "march", "april", "may", "june", "july",
    "august", "september", "october", "november", "december", "everyone", "team",
];

fn push_unique(out: &mut Vec<String>, value: &str, limit: usize) {
    if out.len() < limit && !out.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        out.push(value.to_string());
    }
}

/// People mentioned via `@handle` or "from/with/call <Name>".
pub fn people(text: &str, limit: usize) -> Vec<String> {
    let p = patterns();
    let mut found = Vec::new();
    for caps in p.at_mention.captures_iter(text) {
        push_unique(&mut found, &caps[1], limit);
    }
    for caps in p.named_person.captures_iter(text) {
        let name = &caps[1];
        let lowered = name.to_lowercase();
        if is_stop_word(&lowered) || NOT_NAMES.contains(&lowered.as_str()) {
            continue;
        }
        push_unique(&mut found, name, limit);
    }
    found
}

/// Projects mentioned via "project X", "X project" or `#tag`.
pub fn projects(text: &str, limit: usize) -> Vec<String> {
    let p = patterns();
    let mut found = Vec::new();
    let captures = p
        .project_after
        .captures_iter(text)
        .chain(p.project_before.captures_iter(text))
        .chain(p.hashtag.captures_iter(text));
    for caps in captures {
        let name = &caps[1];
        let lowered = name.to_lowercase();
        if is_stop_word(&lowered) || lowered == "project" || lowered == "new" {
            continue;
        }
        push_unique(&mut found, name, limit);
    }
    found
}

/// Phrases following "due", "deadline", "by", "before" or "until".
pub fn deadline_phrases(text: &str, limit: usize) -> Vec<String> {
    let mut found = Vec::new();
    for caps in patterns().deadline_phrase.captures_iter(text) {
        let phrase = caps[1].trim();
        if !phrase.is_empty() {
            push_unique(&mut found, phrase, limit);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_handles_and_names() {
        let text = "Sync with Maria and @devon about the launch; email from Friday is stale";
        assert_eq!(people(text, 5), vec!["devon", "Maria"]);
    }

    #[test]
    fn people_are_deduplicated_and_capped() {
        let text = "@a @b @a @c";
        assert_eq!(people(text, 2), vec!["a", "b"]);
    }

    #[test]
    fn finds_projects() {
        let text = "Update the Apollo project and project zeus, see #billing";
        assert_eq!(projects(text, 3), vec!["zeus", "Apollo", "billing"]);
        assert!(projects("the project is late", 3).is_empty());
    }

    #[test]
    fn finds_deadline_phrases() {
        let text = "Report due Friday at noon. Invoice deadline: end of month";
        assert_eq!(
            deadline_phrases(text, 3),
            vec!["Friday at noon", "end of month"]
        );
        assert!(deadline_phrases("", 3).is_empty());
    }
}
