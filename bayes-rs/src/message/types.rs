use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Suffix marking a message id derived from content
pub const GENERATED_ID_SUFFIX: &str = "@bayes_generated";

/// Body bytes hashed into a generated message id
const GENERATED_ID_BODY_BYTES: usize = 4096;

/// Parsed message as seen by the classifier
///
/// Built by the mail parsing layer; read-only for the classifier.
#[derive(Debug, Clone, Default)]
pub struct MessageView {
    /// Stable identifier used for the seen flag
    pub msgid: String,
    /// Receive time, seconds since the epoch
    pub received: i64,
    /// Decoded, visible body text lines
    pub body: Vec<String>,
    /// Decoded text the reader cannot see (hidden HTML and such)
    pub invisible: Vec<String>,
    /// URIs found in the body
    pub uris: Vec<String>,
    /// Decoded headers in message order; names may repeat
    pub headers: Vec<(String, String)>,
    /// Extra name/value pairs tokenized like headers
    pub metadata: Vec<(String, String)>,
}

impl MessageView {
    pub fn builder() -> MessageViewBuilder {
        MessageViewBuilder::default()
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a header in message order, case-insensitive
    pub fn header_values<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + 'n
    where
        'a: 'n,
    {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Assembles a [`MessageView`] part by part
#[derive(Debug, Clone, Default)]
pub struct MessageViewBuilder {
    msgid: Option<String>,
    received: Option<i64>,
    body: Vec<String>,
    invisible: Vec<String>,
    uris: Vec<String>,
    headers: Vec<(String, String)>,
    metadata: Vec<(String, String)>,
}

impl MessageViewBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((name.into(), value.into()));
        self
    }

    /// Add rendered body text, split into lines
    pub fn rendered_body(mut self, text: &str) -> Self {
        self.body.extend(text.lines().map(str::to_string));
        self
    }

    pub fn body_line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }

    /// Add invisible body text, split into lines
    pub fn invisible_body(mut self, text: &str) -> Self {
        self.invisible.extend(text.lines().map(str::to_string));
        self
    }

    pub fn invisible_line(mut self, line: impl Into<String>) -> Self {
        self.invisible.push(line.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uris.push(uri.into());
        self
    }

    pub fn uris<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uris.extend(uris.into_iter().map(Into::into));
        self
    }

    /// Use an explicit message id instead of deriving one
    pub fn message_id(mut self, msgid: impl Into<String>) -> Self {
        self.msgid = Some(msgid.into());
        self
    }

    /// Receive time in seconds since the epoch
    pub fn received_at(mut self, timestamp: i64) -> Self {
        self.received = Some(timestamp);
        self
    }

    pub fn build(self) -> MessageView {
        let msgid = self.msgid.clone().unwrap_or_else(|| self.derive_msgid());
        let received = self.received.unwrap_or_else(|| self.derive_received());

        MessageView {
            msgid,
            received,
            body: self.body,
            invisible: self.invisible,
            uris: self.uris,
            headers: self.headers,
            metadata: self.metadata,
        }
    }

    fn first_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Message-Id without brackets, or a digest of the date and body start
    fn derive_msgid(&self) -> String {
        if let Some(id) = self.first_header("Message-Id") {
            let id = id.trim().trim_start_matches('<');
            let id = id.split('>').next().unwrap_or_default().trim();
            if !id.is_empty() {
                return id.to_string();
            }
        }

        let body = self.body.join("\n");
        let body = body.as_bytes();
        let body = &body[..body.len().min(GENERATED_ID_BODY_BYTES)];

        let mut hasher = Sha256::new();
        hasher.update(self.first_header("Date").unwrap_or_default().as_bytes());
        hasher.update([0u8]);
        hasher.update(body);

        let hex: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        format!("{}{}", hex, GENERATED_ID_SUFFIX)
    }

    /// Date of the newest Received hop, else the Date header, else now
    fn derive_received(&self) -> i64 {
        let from_received = self
            .headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case("Received"))
            .and_then(|(_, v)| v.rsplit(';').next())
            .and_then(parse_date);

        from_received
            .or_else(|| self.first_header("Date").and_then(parse_date))
            .unwrap_or_else(|| Utc::now().timestamp())
    }
}

fn parse_date(value: &str) -> Option<i64> {
    let value = value.trim();
    // drop trailing comments such as "(UTC)"
    let value = value.split(" (").next().unwrap_or(value);
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|d| d.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_parts() {
        let msg = MessageView::builder()
            .header("From", "a@example.com")
            .header("Received", "from x by y")
            .header("received", "from z by w")
            .rendered_body("line one\nline two")
            .invisible_body("hidden")
            .uris(vec!["http://example.com/"])
            .metadata("X-Spam-Relays-Trusted", "[ ip=192.0.2.1 ]")
            .received_at(42)
            .build();

        assert_eq!(msg.body, vec!["line one", "line two"]);
        assert_eq!(msg.invisible, vec!["hidden"]);
        assert_eq!(msg.uris, vec!["http://example.com/"]);
        assert_eq!(msg.received, 42);
        assert_eq!(msg.header("FROM"), Some("a@example.com"));
        assert_eq!(msg.header_values("Received").count(), 2);
        assert_eq!(msg.metadata.len(), 1);
    }

    #[test]
    fn test_header_value_outlives_name() {
        let msg = MessageView::builder()
            .header("Subject", "first")
            .header("subject", "second")
            .build();

        let value = {
            let name = String::from("SUBJECT");
            msg.header(&name)
        };
        assert_eq!(value, Some("first"));

        let values: Vec<&str> = {
            let name = String::from("Subject");
            msg.header_values(&name).collect()
        };
        assert_eq!(values, vec!["first", "second"]);
    }

    #[test]
    fn test_msgid_from_header() {
        let msg = MessageView::builder()
            .header("Message-Id", " <abc.123@example.com> ")
            .build();
        assert_eq!(msg.msgid, "abc.123@example.com");
    }

    #[test]
    fn test_explicit_msgid_wins() {
        let msg = MessageView::builder()
            .header("Message-Id", "<abc@example.com>")
            .message_id("custom-id")
            .build();
        assert_eq!(msg.msgid, "custom-id");
    }

    #[test]
    fn test_generated_msgid_is_stable() {
        let build = || {
            MessageView::builder()
                .header("Date", "Mon, 1 Jan 2024 10:00:00 +0000")
                .rendered_body("same body")
                .build()
        };
        let first = build();
        assert!(first.msgid.ends_with(GENERATED_ID_SUFFIX));
        assert_eq!(first.msgid, build().msgid);

        let other = MessageView::builder()
            .header("Date", "Mon, 1 Jan 2024 10:00:00 +0000")
            .rendered_body("other body")
            .build();
        assert_ne!(first.msgid, other.msgid);
    }

    #[test]
    fn test_received_time_from_headers() {
        let msg = MessageView::builder()
            .header("Received", "from a by b; Mon, 1 Jan 2024 10:00:00 +0000")
            .header("Date", "Sun, 31 Dec 2023 10:00:00 +0000")
            .build();
        assert_eq!(msg.received, 1_704_103_200);

        let msg = MessageView::builder()
            .header("Date", "Sun, 31 Dec 2023 10:00:00 +0000 (UTC)")
            .build();
        assert_eq!(msg.received, 1_704_016_800);
    }
}
