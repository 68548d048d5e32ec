//! Name-string preprocessing: normalization, stop words and stemming.
//!
//! Shipping names are short and noisy (honorifics, punctuation, spreadsheet
//! `nan` artifacts), so everything funnels through [`normalize`] before
//! tokenization.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Common English stop words plus honorifics that show up in shipping names.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from",
    "had", "has", "have", "he", "her", "his", "i", "if", "in", "is", "it",
    "its", "me", "my", "no", "not", "of", "on", "or", "our", "she", "so",
    "that", "the", "their", "them", "they", "this", "to", "was", "we", "were",
    "what", "which", "who", "will", "with", "you", "your",
    // honorific noise
    "mr", "mrs", "ms", "mdm", "madam", "miss", "mister", "dr",
];

/// Lowercases a raw name, strips everything that is not an ASCII letter and
/// collapses runs of whitespace. The literal `nan` left behind by spreadsheet
/// exports normalizes to an empty string.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered == "nan" {
        return String::new();
    }
    lowered
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when a name carries no usable text at all.
pub fn is_blank(raw: &str) -> bool {
    normalize(raw).is_empty()
}

/// Case-insensitive stop word filter backed by a `HashSet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopWordsFilter {
    words: HashSet<String>,
}

impl StopWordsFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        Self { words }
    }

    /// The default English list extended with honorifics.
    pub fn english() -> Self {
        Self::new(STOP_WORDS)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn filter<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| t.as_ref().to_string())
            .filter(|t| !self.is_stop_word(t))
            .collect()
    }
}

impl Default for StopWordsFilter {
    fn default() -> Self {
        Self::english()
    }
}

/// Simplified Porter stemmer (suffix stripping, steps 1 through 5).
///
/// Input is expected to be lowercase ASCII, which [`normalize`] guarantees.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PorterStemmer;

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("ization", "ize"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("tional", "tion"),
    ("biliti", "ble"),
    ("entli", "ent"),
    ("ousli", "ous"),
    ("ation", "ate"),
    ("alism", "al"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("ator", "ate"),
    ("eli", "e"),
];

const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ness", ""),
    ("ful", ""),
];

const STEP4_SUFFIXES: &[&str] = &[
    "ement", "ance", "ence", "able", "ible", "ment", "ant", "ent", "ism",
    "ate", "iti", "ous", "ive", "ize", "al", "er", "ic", "ou",
];

impl PorterStemmer {
    pub fn new() -> Self {
        Self
    }

    pub fn stem(&self, word: &str) -> String {
        let mut word = word.to_lowercase();
        if word.len() <= 2 {
            return word;
        }

        // Step 1a: plurals
        if word.ends_with("sses") || word.ends_with("ies") {
            word.truncate(word.len() - 2);
        } else if !word.ends_with("ss") && word.ends_with('s') {
            word.pop();
        }

        // Step 1b: -eed, -ed, -ing
        let mut cleanup = false;
        if word.ends_with("eed") {
            if measure(&word[..word.len() - 3]) > 0 {
                word.pop();
            }
        } else if let Some(stem) = word.strip_suffix("ed") {
            if has_vowel(stem) {
                word.truncate(word.len() - 2);
                cleanup = true;
            }
        } else if let Some(stem) = word.strip_suffix("ing") {
            if has_vowel(stem) {
                word.truncate(word.len() - 3);
                cleanup = true;
            }
        }
        if cleanup {
            if word.ends_with("at") || word.ends_with("bl") || word.ends_with("iz") {
                word.push('e');
            } else if ends_double_consonant(&word)
                && !matches!(word.as_bytes().last(), Some(b'l' | b's' | b'z'))
            {
                word.pop();
            } else if measure(&word) == 1 && ends_cvc(&word) {
                word.push('e');
            }
        }

        // Step 1c: terminal y after a vowel
        if word.ends_with('y') && has_vowel(&word[..word.len() - 1]) {
            word.pop();
            word.push('i');
        }

        // Steps 2 and 3: first matching rule wins
        for rules in [STEP2_RULES, STEP3_RULES] {
            for &(suffix, replacement) in rules {
                if let Some(stem) = word.strip_suffix(suffix) {
                    if measure(stem) > 0 {
                        word = format!("{stem}{replacement}");
                    }
                    break;
                }
            }
        }

        // Step 4: drop residual suffixes from longer stems
        if measure(&word) > 1 {
            if let Some(stem) = word.strip_suffix("ion") {
                if stem.ends_with('s') || stem.ends_with('t') {
                    word.truncate(word.len() - 3);
                }
            } else {
                for &suffix in STEP4_SUFFIXES {
                    if let Some(stem) = word.strip_suffix(suffix) {
                        if measure(stem) > 1 {
                            word.truncate(stem.len());
                        }
                        break;
                    }
                }
            }
        }

        // Step 5a: terminal e
        if word.ends_with('e') {
            let stem = &word[..word.len() - 1];
            let m = measure(stem);
            if m > 1 || (m == 1 && !ends_cvc(stem)) {
                word.pop();
            }
        }
        // Step 5b: double l
        if word.ends_with("ll") && measure(&word) > 1 {
            word.pop();
        }

        word
    }

    pub fn stem_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        tokens.iter().map(|t| self.stem(t.as_ref())).collect()
    }
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

fn has_vowel(word: &str) -> bool {
    word.bytes().any(is_vowel)
}

/// Number of vowel-to-consonant transitions, roughly the syllable count.
fn measure(word: &str) -> usize {
    let mut count = 0;
    let mut prev_vowel = false;
    for b in word.bytes() {
        let vowel = is_vowel(b);
        if !vowel && prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    count
}

fn ends_double_consonant(word: &str) -> bool {
    let bytes = word.as_bytes();
    bytes.len() >= 2
        && bytes[bytes.len() - 1] == bytes[bytes.len() - 2]
        && !is_vowel(bytes[bytes.len() - 1])
}

/// Consonant-vowel-consonant ending where the last consonant is not w, x or y.
fn ends_cvc(word: &str) -> bool {
    let bytes = word.as_bytes();
    if bytes.len() < 3 {
        return false;
    }
    let last = bytes[bytes.len() - 1];
    !is_vowel(last)
        && is_vowel(bytes[bytes.len() - 2])
        && !is_vowel(bytes[bytes.len() - 3])
        && !matches!(last, b'w' | b'x' | b'y')
}

/// The full tokenize / stop-word / stem pipeline applied to one raw name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    stop_words: StopWordsFilter,
    stemmer: PorterStemmer,
}

impl Preprocessor {
    /// Tokens for one raw name. Single-character leftovers (initials, the
    /// `s`/`o` shards of "s/o") are dropped.
    pub fn tokens(&self, raw: &str) -> Vec<String> {
        normalize(raw)
            .split_whitespace()
            .filter(|t| !self.stop_words.is_stop_word(t))
            .map(|t| self.stemmer.stem(t))
            .filter(|t| t.len() > 1)
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            stop_words: StopWordsFilter::english(),
            stemmer: PorterStemmer::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_digits() {
        assert_eq!(normalize("Tan/Lee Mei-Ling 88"), "tan lee mei ling");
        assert_eq!(normalize("  Rajesh   KUMAR "), "rajesh kumar");
    }

    #[test]
    fn normalize_treats_nan_as_blank() {
        assert_eq!(normalize("nan"), "");
        assert_eq!(normalize(" NaN "), "");
        assert!(is_blank(""));
        assert!(is_blank("42 / 7"));
        assert!(!is_blank("Tan"));
    }

    #[test]
    fn stop_words_match_case_insensitively() {
        let filter = StopWordsFilter::english();
        assert!(filter.is_stop_word("The"));
        assert!(filter.is_stop_word("mdm"));
        assert!(!filter.is_stop_word("rahman"));
        assert_eq!(filter.filter(&["mr", "tan", "and", "sons"]), vec!["tan", "sons"]);
    }

    #[test]
    fn porter_stems_common_suffixes() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("ponies"), "poni");
        assert_eq!(stemmer.stem("caresses"), "caress");
        assert_eq!(stemmer.stem("relational"), "relat");
        assert_eq!(stemmer.stem("hopeful"), "hope");
    }

    #[test]
    fn porter_leaves_short_words_alone() {
        let stemmer = PorterStemmer::new();
        assert_eq!(stemmer.stem("ng"), "ng");
        assert_eq!(stemmer.stem("sky"), "sky");
    }

    #[test]
    fn preprocessor_handles_shipping_name_noise() {
        let prep = Preprocessor::default();
        assert_eq!(
            prep.tokens("Mr. Rajesh Kumar s/o Maniam"),
            vec!["rajesh", "kumar", "maniam"]
        );
        assert!(prep.tokens("nan").is_empty());
        assert!(prep.tokens("").is_empty());
    }

    #[test]
    fn preprocessor_keeps_name_particles() {
        // bin/binti are signal for this task, not stop words
        let prep = Preprocessor::default();
        assert_eq!(
            prep.tokens("Nurul Binti Rahman"),
            vec!["nurul", "binti", "rahman"]
        );
    }
}
