//! Keyword-based intent routing.
//!
//! Routing is deterministic: a message is split into lowercase words and
//! matched against two fixed vocabularies. A vocabulary entry may span several
//! words ("good morning"); it matches when those words appear contiguously.
//! Greetings match whole words only. Document words also match inflected
//! forms, so "programs" and "explained" count as "program" and "explain".

use std::fmt;

use serde::Serialize;

/// Greeting vocabulary.
pub const GREETINGS: &[&str] = &["hi", "hello", "hey", "good morning", "good evening"];

/// Vocabulary that signals a question about the uploaded document.
pub const DOCUMENT_WORDS: &[&str] = &[
    "summarize",
    "summary",
    "explain",
    "analyze",
    "document",
    "file",
    "content",
    "details",
    "program",
    "pdf",
];

/// Maximum word count for a message to be treated as a greeting.
pub const GREETING_MAX_WORDS: usize = 3;

/// Routing decision for one incoming message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Short greeting answered from the canned set.
    Greeting,
    /// Question grounded in the user's stored document.
    DocumentQuery,
    /// Anything else, grounded in retrieved memory.
    GeneralQuery,
}

impl Intent {
    /// Stable string form for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::DocumentQuery => "document_query",
            Self::GeneralQuery => "general_query",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent router over fixed vocabularies.
#[derive(Clone, Debug)]
pub struct IntentRouter {
    greetings: Vec<Vec<String>>,
    document_words: Vec<Vec<String>>,
    greeting_max_words: usize,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new(GREETINGS, DOCUMENT_WORDS)
    }
}

impl IntentRouter {
    /// Build a router from custom vocabularies.
    #[must_use]
    pub fn new(greetings: &[&str], document_words: &[&str]) -> Self {
        Self {
            greetings: greetings.iter().map(|entry| words(entry)).collect(),
            document_words: document_words.iter().map(|entry| words(entry)).collect(),
            greeting_max_words: GREETING_MAX_WORDS,
        }
    }

    /// Classify a message.
    ///
    /// `has_document` tells whether the user currently has a stored document;
    /// without one, document vocabulary falls through to a general query.
    #[must_use]
    pub fn classify(&self, message: &str, has_document: bool) -> Intent {
        let lowered = message.to_lowercase();
        let tokens = words(&lowered);

        if message.split_whitespace().count() <= self.greeting_max_words
            && contains_any(&tokens, &self.greetings)
        {
            return Intent::Greeting;
        }

        if has_document && self.mentions_document(&lowered) {
            return Intent::DocumentQuery;
        }

        Intent::GeneralQuery
    }

    /// Whether a message uses document vocabulary.
    #[must_use]
    pub fn mentions_document(&self, message: &str) -> bool {
        let tokens = words(&message.to_lowercase());
        self.document_words
            .iter()
            .any(|entry| contains_phrase_by(&tokens, entry, |token, word| token.starts_with(word)))
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric() && ch != '\'')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_any(tokens: &[String], vocabulary: &[Vec<String>]) -> bool {
    vocabulary
        .iter()
        .any(|entry| contains_phrase_by(tokens, entry, |token, word| token == word))
}

fn contains_phrase_by<F>(tokens: &[String], phrase: &[String], matches: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return false;
    }
    tokens.windows(phrase.len()).any(|window| {
        window
            .iter()
            .zip(phrase)
            .all(|(token, word)| matches(token.as_str(), word.as_str()))
    })
}
