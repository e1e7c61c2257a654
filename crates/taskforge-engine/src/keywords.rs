use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z][a-zA-Z0-9_-]{2,}").expect("word regex"));

// Words too common in task text to seed a useful search.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "should", "would", "could",
    "able", "will", "when", "then", "than", "them", "they", "there", "where", "which", "what",
    "have", "has", "had", "can", "all", "any", "are", "was", "were", "been", "being", "its",
    "it's", "user", "users", "task", "tasks", "add", "adds", "use", "uses", "using", "via",
    "each", "also", "must", "may", "might", "need", "needs", "new", "existing",
];

/// Pull searchable keywords out of task text: lowercase word tokens, minus
/// stopwords, first occurrence order, capped at `max`.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let stop: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for m in WORD_RE.find_iter(text) {
        let word = m.as_str().to_lowercase();
        if stop.contains(word.as_str()) {
            continue;
        }
        if seen.insert(word.clone()) {
            keywords.push(word);
            if keywords.len() >= max {
                break;
            }
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_in_order_without_stopwords() {
        let keywords = extract_keywords("User should be able to reset password via email", 8);
        assert_eq!(keywords, vec!["reset", "password", "email"]);
    }

    #[test]
    fn test_dedupes_and_caps() {
        let keywords = extract_keywords("login login login auth oauth token session cookie", 3);
        assert_eq!(keywords, vec!["login", "auth", "oauth"]);
    }

    #[test]
    fn test_short_tokens_dropped() {
        let keywords = extract_keywords("fix db io in ui", 8);
        assert_eq!(keywords, vec!["fix"]);
    }
}
