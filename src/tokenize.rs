
use std::collections::HashSet;

/// English stop words used when no list is configured.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
    "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    "what", "which", "who", "whom", "this", "that", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
    "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as", "until",
    "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "in", "out", "on", "off", "over", "under", "again", "further", "then", "once", "here",
    "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
    "than", "too", "very", "s", "t", "can", "will", "just", "don", "should", "now", "lrb", "rrb",
];

// defines the behavior needed for tokenizing a corpus line
pub trait Tokenizer: Sync {
    fn tokenize(&self, line: &str) -> Vec<String>;
}

/// Splits on whitespace after stripping punctuation, lowercases, and drops stop words and
/// tokens carrying digits. Document markers (`<doc ...>`, `</doc>`) produce no tokens.
#[derive(Clone, Debug)]
pub struct StopWordTokenizer {
    stop_words: HashSet<String>,
}

impl StopWordTokenizer {

    pub fn new(stop_words: HashSet<String>) -> Self {
        Self { stop_words }
    }

    pub fn with_default_stop_words() -> Self {
        Self::new(DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect())
    }

    fn keep(&self, token: &str) -> bool {
        !token.is_empty()
            && !self.stop_words.contains(token)
            && !token.chars().any(|c| c.is_ascii_digit())
    }
}

impl Tokenizer for StopWordTokenizer {

    fn tokenize(&self, line: &str) -> Vec<String> {

        if line.starts_with("<doc") || line.starts_with("</doc") {
            return Vec::new();
        }

        let cleaned: String = line
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || *c == '\u{0B}')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        cleaned
            .split(|c: char| c.is_ascii_whitespace() || c == '\u{0B}')
            .filter(|token| self.keep(token))
            .map(|token| token.to_string())
            .collect()
    }
}

/// Splits on single spaces and keeps every token, for corpora that are already normalized.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, line: &str) -> Vec<String> {
        line.split_whitespace().map(|x| x.to_string()).collect()
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn strips_punctuation_and_stop_words() {
        let tokenizer = StopWordTokenizer::with_default_stop_words();
        let tokens = tokenizer.tokenize("The Quick, brown fox -- jumps over the lazy dog!");
        assert_eq!(tokens, vec!["quick", "brown", "fox", "jumps", "lazy", "dog"]);
    }

    #[test]
    fn drops_tokens_with_digits_and_doc_markers() {
        let tokenizer = StopWordTokenizer::new(HashSet::new());
        assert_eq!(tokenizer.tokenize("born in 1984 at b2b events"), vec!["born", "in", "at", "events"]);
        assert!(tokenizer.tokenize("<doc id=\"12\" title=\"alpha\">").is_empty());
        assert!(tokenizer.tokenize("</doc>").is_empty());
    }

    #[test]
    fn custom_stop_words_replace_the_default() {
        let stop_words: HashSet<String> = ["beta".to_string()].into_iter().collect();
        let tokenizer = StopWordTokenizer::new(stop_words);
        assert_eq!(tokenizer.tokenize("alpha beta the gamma"), vec!["alpha", "the", "gamma"]);
    }

    #[test]
    fn non_ascii_letters_are_removed() {
        let tokenizer = StopWordTokenizer::new(HashSet::new());
        assert_eq!(tokenizer.tokenize("café naïve"), vec!["caf", "nave"]);
    }
}
