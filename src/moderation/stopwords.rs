use std::collections::HashSet;
use std::sync::OnceLock;

/// NLTK English stopword list.
const ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't",
    "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven",
    "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn",
    "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't",
    "won", "won't", "wouldn", "wouldn't",
];

/// Clitics split off by contraction handling (`don't` -> `do`, `n't`). The
/// stems `ca` and `wo` from `can't` and `won't` are not in the list and are
/// kept.
const CLITICS: &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

fn set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ENGLISH.iter().chain(CLITICS).copied().collect())
}

/// Expects a lowercase token. Punctuation-only tokens count as stopwords.
#[must_use]
pub fn is_stopword(token: &str) -> bool {
    set().contains(token) || !token.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_words_are_stopwords() {
        for word in ["the", "and", "you", "don't", "won", "n't", "'s"] {
            assert!(is_stopword(word), "{word} should be a stopword");
        }
    }

    #[test]
    fn test_punctuation_is_stopword() {
        for token in ["!", "...", "?!", "''", "``", "-", "🙂"] {
            assert!(is_stopword(token), "{token} should be dropped");
        }
    }

    #[test]
    fn test_content_words_are_kept() {
        for word in ["ugly", "loser", "photo", "2024", "ca", "wo"] {
            assert!(!is_stopword(word), "{word} should be kept");
        }
    }
}
