//! Sender and recipient ignore lists

use regex::Regex;

use crate::config::BayesConfig;
use crate::error::{BayesError, Result};
use crate::message::MessageView;
use crate::tokenizer::headers::find_addresses;

/// Headers naming the sender
const FROM_HEADERS: &[&str] = &["From", "Envelope-From", "Resent-From", "Sender", "Return-Path"];

/// Headers naming recipients
const TO_HEADERS: &[&str] = &[
    "To",
    "Cc",
    "Resent-To",
    "Resent-Cc",
    "Envelope-To",
    "Delivered-To",
];

/// Address pattern from an ignore list
///
/// `*` matches any run of characters and `?` a single one; matching is
/// case-insensitive and covers the whole address. A pattern starting with
/// `@` matches every address of that domain.
#[derive(Debug, Clone)]
pub struct AddressPattern {
    pattern: String,
    regex: Regex,
}

impl AddressPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = if pattern.starts_with('@') {
            format!("*{}", pattern)
        } else {
            pattern.to_string()
        };

        let mut re = String::from("(?i)^");
        for c in glob.chars() {
            match c {
                '*' => re.push_str(".*"),
                '?' => re.push('.'),
                other => re.push_str(&regex::escape(&other.to_string())),
            }
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|source| BayesError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, address: &str) -> bool {
        self.regex.is_match(address)
    }
}

/// Decides whether a message is left alone by scan, learn and forget
#[derive(Debug, Clone, Default)]
pub struct IgnorePolicy {
    from: Vec<AddressPattern>,
    to: Vec<AddressPattern>,
}

impl IgnorePolicy {
    pub fn new(config: &BayesConfig) -> Result<Self> {
        Ok(Self {
            from: compile(&config.ignore_from)?,
            to: compile(&config.ignore_to)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }

    /// The first ignore pattern matching the message, if any
    pub fn matching_pattern(&self, message: &MessageView) -> Option<&str> {
        first_match(&self.from, message, FROM_HEADERS)
            .or_else(|| first_match(&self.to, message, TO_HEADERS))
    }

    pub fn is_ignored(&self, message: &MessageView) -> bool {
        self.matching_pattern(message).is_some()
    }
}

fn compile(patterns: &[String]) -> Result<Vec<AddressPattern>> {
    patterns.iter().map(|p| AddressPattern::new(p)).collect()
}

fn first_match<'a>(
    patterns: &'a [AddressPattern],
    message: &MessageView,
    headers: &[&str],
) -> Option<&'a str> {
    if patterns.is_empty() {
        return None;
    }

    for name in headers {
        for value in message.header_values(name) {
            for address in find_addresses(value) {
                if let Some(p) = patterns.iter().find(|p| p.matches(&address)) {
                    return Some(p.pattern());
                }
            }
        }
    }
    None
}
