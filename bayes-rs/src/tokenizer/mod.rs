//! Message tokenization
//!
//! Turns a [`MessageView`] into the deduplicated set of hashed tokens the
//! classifier learns from and scores with. Body lines, URIs, invisible
//! text and headers are each tokenized with their own prefix and region
//! rules, then hashed into [`Token`]s.

pub mod headers;
pub mod line;
pub mod tables;
pub mod token;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::BayesConfig;
use crate::message::MessageView;

pub use line::{LineTokenizer, Region};
pub use token::Token;

/// Prefix for tokens from text the reader cannot see
const INVISIBLE_PREFIX: &str = "I*:";

/// Message tokenizer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    line: LineTokenizer,
    ignore_headers: HashSet<String>,
}

impl Tokenizer {
    pub fn new(config: &BayesConfig) -> Self {
        Self {
            line: LineTokenizer::new(config.max_token_length),
            ignore_headers: config
                .ignore_headers
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
        }
    }

    /// Normalized token strings of a message, before hashing
    pub fn token_strings(&self, message: &MessageView) -> BTreeSet<String> {
        let mut out = Vec::new();

        for line in &message.body {
            self.line.tokenize(line, "", Region::Body, &mut out);
        }
        for uri in &message.uris {
            self.line.tokenize(uri, "", Region::Uri, &mut out);
        }
        for line in &message.invisible {
            self.line.tokenize(line, INVISIBLE_PREFIX, Region::Body, &mut out);
        }

        let parsed = headers::chew_headers(&message.headers, &message.metadata, &self.ignore_headers);
        for (name, value) in &parsed {
            self.line.tokenize(value, &format!("H{}:", name), Region::Header, &mut out);
        }

        out.into_iter().filter(|t| !t.is_empty()).collect()
    }

    /// Hashed tokens of a message, each with the string it came from
    ///
    /// When two strings hash to the same token the lexically smaller one
    /// is kept as its source.
    pub fn tokenize(&self, message: &MessageView) -> BTreeMap<Token, String> {
        let mut tokens = BTreeMap::new();
        for text in self.token_strings(message) {
            tokens.entry(Token::from_text(&text)).or_insert(text);
        }
        tokens
    }
}
