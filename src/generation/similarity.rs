use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex"));

const STOP_WORDS: &[&str] = &[
    "and", "or", "the", "a", "an", "in", "on", "at", "to", "for", "with", "by", "about", "like",
    "as", "of", "do", "does", "how", "what", "when", "where", "why", "would", "could", "should",
    "their", "they", "this", "that", "these", "those", "be", "been", "being", "is", "am", "are",
    "was", "were", "has", "have", "had", "not", "from",
];

/// Lowercased word tokens longer than three characters that are not stop words.
fn significant_words(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Jaccard index over the significant vocabulary of two texts.
///
/// Returns 0.0 when either side has no significant words.
pub fn similarity(a: &str, b: &str) -> f64 {
    let words_a = significant_words(a);
    let words_b = significant_words(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let shared = words_a.intersection(&words_b).count();
    let total = words_a.union(&words_b).count();
    shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_scores_one() {
        let q = "What historical context does Chomsky provide about the Cuban missile crisis?";
        assert_eq!(similarity(q, q), 1.0);
    }

    #[test]
    fn empty_or_insignificant_text_scores_zero() {
        assert_eq!(similarity("Imperial power and propaganda", ""), 0.0);
        // every token is a stop word or too short
        assert_eq!(similarity("What is the way to do it?", "What is the way to do it?"), 0.0);
    }

    #[test]
    fn score_is_symmetric_and_bounded() {
        let pairs = [
            ("Manufacturing consent in modern media", "How media systems manufacture consent"),
            ("Labor movements and unions", "Universal grammar in linguistics"),
            ("ÉLAN vital über alles", "élan vital"),
        ];
        for (a, b) in pairs {
            let ab = similarity(a, b);
            let ba = similarity(b, a);
            assert_eq!(ab, ba);
            assert!((0.0..=1.0).contains(&ab));
        }
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        // {media, propaganda, model} on both sides
        assert_eq!(similarity("The Propaganda Model of MEDIA!", "media: propaganda, model?"), 1.0);
    }

    #[test]
    fn partial_overlap_is_jaccard() {
        // {sanctions, policy, iran} vs {sanctions, policy, cuba}: 2 shared / 4 total
        let score = similarity("sanctions policy iran", "sanctions policy cuba");
        assert!((score - 0.5).abs() < 1e-9);
    }
}
