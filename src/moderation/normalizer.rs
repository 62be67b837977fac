use regex::Regex;
use std::sync::OnceLock;

use super::lemmatizer::{self, PartOfSpeech};
use super::stopwords::is_stopword;

/// Lemmatization is repeated until the word stops changing so that
/// normalizing normalized text is a no-op.
const MAX_LEMMA_PASSES: usize = 8;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+(?:'\w+)*|[^\w\s]+").expect("Invalid regex"))
}

/// Splits text into word and punctuation tokens, treebank style:
/// `don't` becomes `do` + `n't`, `she's` becomes `she` + `'s`.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let text = text.replace(['\u{2019}', '\u{2018}'], "'");
    let mut tokens = Vec::new();

    for m in token_regex().find_iter(&text) {
        let token = m.as_str();

        if token.len() > 3 && token.to_ascii_lowercase().ends_with("n't") {
            tokens.push(token[..token.len() - 3].to_string());
            tokens.push(token[token.len() - 3..].to_string());
        } else if let Some(idx) = token.find('\'') {
            if idx > 0 {
                tokens.push(token[..idx].to_string());
            }
            tokens.push(token[idx..].to_string());
        } else {
            tokens.push(token.to_string());
        }
    }

    tokens
}

fn lemma_of(word: &str) -> String {
    let mut current = word.to_string();
    for _ in 0..MAX_LEMMA_PASSES {
        let pos = PartOfSpeech::from_tag(lemmatizer::tag(&current));
        let next = lemmatizer::lemmatize(&current, pos);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Reduces raw comment text to space-separated lowercase lemmas with
/// stopwords and punctuation removed. Empty input gives an empty string.
#[must_use]
pub fn normalize(text: &str) -> String {
    tokenize(text)
        .into_iter()
        .map(|token| token.to_lowercase())
        .filter(|token| !is_stopword(token))
        .flat_map(|token| {
            token
                .split('\'')
                .filter(|part| !part.is_empty() && !is_stopword(part))
                .map(lemma_of)
                .collect::<Vec<_>>()
        })
        .filter(|lemma| !is_stopword(lemma))
        .collect::<Vec<_>>()
        .join(" ")
}
