//! RFC 5322 message parsing into a [`MessageView`]

use mail_parser::MessageParser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::types::MessageView;
use crate::error::{BayesError, Result};

static URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:https?|ftp)://[^\s<>"']+"#).expect("uri pattern is valid")
});

/// Parse a raw message
///
/// Headers keep their raw (unfolded) values, since the tokenizer works on
/// MTA formatting. The decoded subject becomes the first body line, ahead
/// of the decoded text parts; URIs come from both the text and the HTML
/// parts. Message id and receive time are derived from the
/// headers by [`MessageView::builder`].
pub fn parse_rfc822(raw: &[u8]) -> Result<MessageView> {
    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| BayesError::Parse("not an RFC 5322 message".to_string()))?;

    let mut builder = MessageView::builder();

    for header in parsed.headers() {
        let value = raw
            .get(header.offset_start as usize..header.offset_end as usize)
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        builder = builder.header(header.name(), unfold(&value));
    }

    // Subject is read as the first body line, not as a header
    if let Some(subject) = parsed.subject() {
        builder = builder.body_line(unfold(subject));
    }

    let mut uris: Vec<String> = Vec::new();
    let mut collect_uris = |text: &str| {
        for m in URI.find_iter(text) {
            let uri = m.as_str().trim_end_matches(['.', ',', ')', ';']);
            if !uris.iter().any(|u| u == uri) {
                uris.push(uri.to_string());
            }
        }
    };

    let mut text_parts = 0;
    while let Some(text) = parsed.body_text(text_parts) {
        collect_uris(&*text);
        builder = builder.rendered_body(&text);
        text_parts += 1;
    }

    let mut html_parts = 0;
    while let Some(html) = parsed.body_html(html_parts) {
        collect_uris(&*html);
        html_parts += 1;
    }

    debug!(
        "Parsed message: {} text parts, {} html parts, {} uris",
        text_parts,
        html_parts,
        uris.len()
    );

    Ok(builder.uris(uris).build())
}

/// Join folded header lines into one
fn unfold(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
