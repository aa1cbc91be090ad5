//! Character counting, word matching and length fitting shared by the
//! meta and content stages. Lengths are always counted in `char`s.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}]+)?").expect("static word regex is valid")
});

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Lowercased words of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Number of times the words of `phrase` appear consecutively in `words`
pub fn count_phrase(words: &[String], phrase: &str) -> usize {
    let needle = tokenize(phrase);
    if needle.is_empty() || needle.len() > words.len() {
        return 0;
    }
    words
        .windows(needle.len())
        .filter(|window| *window == needle.as_slice())
        .count()
}

/// Whole-word, case-insensitive phrase match
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    count_phrase(&tokenize(haystack), phrase) > 0
}

/// Capitalize lowercase words, leaving acronyms and mixed case alone
pub fn display_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            if word.chars().any(char::is_uppercase) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pad `seed` with `padding` pieces until it reaches `min`, then cut it back
/// under `max`, preferring a sentence end, then a word boundary.
///
/// The result is within `[min, max]` whenever `padding` contains a
/// non-empty piece.
pub fn fit_length(seed: &str, min: usize, max: usize, padding: &[String]) -> String {
    let mut text = seed.trim().to_string();

    if padding.iter().any(|piece| !piece.is_empty()) {
        let mut pieces = padding.iter().filter(|piece| !piece.is_empty()).cycle();
        while char_len(&text) < min {
            if let Some(piece) = pieces.next() {
                text.push_str(piece);
            }
        }
    }

    if char_len(&text) <= max {
        return text;
    }
    truncate_between(&text, min, max)
}

fn truncate_between(text: &str, min: usize, max: usize) -> String {
    let cut: String = text.chars().take(max).collect();

    if let Some(idx) = cut.rfind(". ") {
        let sentence = &cut[..=idx];
        if char_len(sentence) >= min {
            return sentence.to_string();
        }
    }

    if let Some(idx) = cut.rfind(' ') {
        let words = cut[..idx].trim_end_matches([',', ';', ':', '-', '|', ' ']);
        if char_len(words) >= min {
            return words.to_string();
        }
    }

    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(char_len("₹₹"), 2);
        assert_eq!(char_len("Bandra"), 6);
    }

    #[test]
    fn tokenizes_words_lowercase() {
        assert_eq!(
            tokenize("PU Polish, in Bandra (West)!"),
            vec!["pu", "polish", "in", "bandra", "west"]
        );
        assert_eq!(tokenize("Don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn phrase_matching_respects_word_boundaries() {
        assert!(contains_phrase("Get a quote today", "get"));
        assert!(!contains_phrase("Fits any budget", "get"));
        assert!(contains_phrase("Wood polishing in Bandra West", "bandra west"));
        assert!(!contains_phrase("Bandra", "bandra west"));
    }

    #[test]
    fn counts_repeated_phrases() {
        let words = tokenize("teak polish and more teak polish, then Teak Polish");
        assert_eq!(count_phrase(&words, "teak polish"), 3);
        assert_eq!(count_phrase(&words, ""), 0);
    }

    #[test]
    fn display_case_keeps_acronyms() {
        assert_eq!(display_case("pu polish"), "Pu Polish");
        assert_eq!(display_case("PU polish"), "PU Polish");
        assert_eq!(display_case("furniture  polishing"), "Furniture Polishing");
    }

    #[test]
    fn fit_length_pads_short_input() {
        let padding = vec![" Call today.".to_string()];
        let fitted = fit_length("Short", 20, 30, &padding);
        let len = char_len(&fitted);
        assert!((20..=30).contains(&len), "{fitted:?}");
    }

    #[test]
    fn fit_length_trims_long_input_at_word_boundary() {
        let long = "word ".repeat(100);
        let fitted = fit_length(&long, 150, 160, &[" x".to_string()]);
        let len = char_len(&fitted);
        assert!((150..=160).contains(&len), "{len}");
        assert!(fitted.ends_with("word"));
    }

    #[test]
    fn fit_length_hard_cuts_unbroken_input() {
        let long = "a".repeat(500);
        let fitted = fit_length(&long, 150, 160, &[" x".to_string()]);
        assert_eq!(char_len(&fitted), 160);
    }
}
