//! Header selection and per-header normalization

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashSet};

use super::line::mail_addr_tokens;
use super::tables::{compress_header_name, IGNORED_HEADERS, PRESENCE_ONLY_HEADERS};

static OUTLOOK_EXPRESS_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<([0-9a-f]{4})[0-9a-f]{4}[0-9a-f]{4}\$([0-9a-f]{4})[0-9a-f]{4}\$([0-9a-f]{8})@(\S+)>",
    )
    .expect("outlook express id pattern is valid")
});
static EXIM_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[A-Za-z0-9]{7}-[A-Za-z0-9]{6}-0[A-Za-z0-9]@").expect("exim id pattern is valid")
});
static SENDMAIL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[0-9]{14}\.[A-F0-9]{5,6}@").expect("sendmail id pattern is valid"));
static NON_ID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^_A-Za-z0-9]").expect("id char pattern is valid"));

static RCVD_SENDMAIL_SMTP_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\swith\sSMTP\sid\sg[0-9A-Z]{10,12}\s").expect("received pattern is valid")
});
static RCVD_SENDMAIL_ESMTP_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\swith\sESMTP\sid\s[0-9A-F]{10,12}\s").expect("received pattern is valid")
});
static RCVD_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bid\s[a-zA-Z0-9]{7,20}\b").expect("received pattern is valid"));
static RCVD_EXIM_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bid\s[A-Za-z0-9]{7}-[A-Za-z0-9]{6}-0[A-Za-z0-9]").expect("received pattern is valid")
});
static RCVD_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?:(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun),\s)?
        [0-3\s]?[0-9]\s(?:Jan|Feb|Ma[ry]|Apr|Ju[nl]|Aug|Sep|Oct|Nov|Dec)\s
        (?:19|20)?[0-9]{2}\s[0-2][0-9](?::[0-5][0-9]){1,2}\s
        (?:\s*\(|\)|\s*(?:[+-][0-9]{4})|\s*(?:UT|[A-Z]{2,3}T))*",
    )
    .expect("received date pattern is valid")
});
static RCVD_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\b")
        .expect("ipv4 pattern is valid")
});
static RCVD_WITH_PROTO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\swith\s(?:ESMTP|SMTP|LMTP|HTTP|ESMTPSA|ESMTPA|ESMTPS)\s")
        .expect("received pattern is valid")
});
static RCVD_CONNECTORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:helo|by|for|from|with|id|via)\b").expect("received pattern is valid")
});

static CT_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)boundary=["'](.*?)["']"#).expect("boundary pattern is valid")
});
static HEX_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-fA-F0-9]").expect("hex pattern is valid"));
static BOUNDARY_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([-_.=]+)").expect("separator pattern is valid"));
static CT_STOP_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:text|charset)\b").expect("content type pattern is valid"));

static ADDRESS_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:X-|Resent-)?(?:Return-Path|From|To|Cc|Reply-To|Errors-To|Mail-Followup-To|Sender)$",
    )
    .expect("address header pattern is valid")
});
static MESSAGE_ID_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:X-|Resent-)?Message-Id$").expect("message id header pattern is valid")
});
static ADDRESS_IN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:mailto:)?\s*([-a-z0-9_+:=!#$%&*^?{}|~/.]+@[-a-z0-9_+:/]+(?:\.[-a-z0-9_+:/]+)+)",
    )
    .expect("address pattern is valid")
});

/// Collect the headers worth tokenizing, keyed by (compressed) header name
///
/// Values sharing a name are joined with spaces. `ignore` holds extra
/// header names, lower-cased, that the user excluded.
pub fn chew_headers(
    headers: &[(String, String)],
    metadata: &[(String, String)],
    ignore: &HashSet<String>,
) -> BTreeMap<String, String> {
    let mut selected: Vec<(&str, &str)> = Vec::new();
    let mut received: Vec<(&str, &str)> = Vec::new();

    for (name, value) in headers {
        if name.eq_ignore_ascii_case("Received") {
            received.push((name.as_str(), value.as_str()));
            continue;
        }
        if IGNORED_HEADERS.is_match(name) {
            continue;
        }
        selected.push((name.as_str(), value.as_str()));
    }

    selected.extend(metadata.iter().map(|(n, v)| (n.as_str(), v.as_str())));

    // the last two hops carry the spamware HELO names and relays
    selected.extend(received.iter().rev().take(2).copied());

    let mut parsed: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in selected {
        if ignore.contains(&name.to_lowercase()) {
            continue;
        }

        let value = chew_value(name, value.trim_end());

        if name.eq_ignore_ascii_case("In-Reply-To")
            || name.eq_ignore_ascii_case("References")
            || name.eq_ignore_ascii_case("Message-ID")
        {
            append_group(&mut parsed, "*MI", &value);
        }
        if name.eq_ignore_ascii_case("From")
            || name.eq_ignore_ascii_case("To")
            || name.eq_ignore_ascii_case("Cc")
        {
            append_group(&mut parsed, "*Ad", &value);
        }
        if name.eq_ignore_ascii_case("X-Mailer") || name.eq_ignore_ascii_case("User-Agent") {
            append_group(&mut parsed, "*UA", &value);
        }

        let key = compress_header_name(name).unwrap_or(name);
        parsed
            .entry(key.to_string())
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    parsed
}

fn append_group(parsed: &mut BTreeMap<String, String>, group: &str, value: &str) {
    let entry = parsed.entry(group.to_string()).or_default();
    entry.push_str(value);
    entry.push(' ');
}

fn chew_value(name: &str, value: &str) -> String {
    if MESSAGE_ID_HEADER.is_match(name) {
        chew_message_id(value)
    } else if ADDRESS_HEADER.is_match(name) {
        chew_addr_header(value)
    } else if name.eq_ignore_ascii_case("Received") {
        chew_received(value)
    } else if name.eq_ignore_ascii_case("Content-Type") {
        chew_content_type(value)
    } else if name.eq_ignore_ascii_case("MIME-Version") {
        value.replacen("1.0", "", 1)
    } else if PRESENCE_ONLY_HEADERS.is_match(name) {
        "1".to_string()
    } else {
        value.to_string()
    }
}

/// Strip MTA-generated id formats and split what is left on non-word chars
pub fn chew_message_id(value: &str) -> String {
    let value = OUTLOOK_EXPRESS_ID.replace_all(value, " OEA${1} OEB${2} OEC${3} ${4} ");
    let value = EXIM_ID.replace(&value, "").into_owned();
    let value = SENDMAIL_ID.replace(&value, "").into_owned();
    NON_ID_CHARS.replace_all(&value, " ").into_owned()
}

/// Drop the parts of a Received header that are unique per message
pub fn chew_received(value: &str) -> String {
    let mut value = RCVD_SENDMAIL_SMTP_ID.replace_all(value, " ").into_owned();
    value = RCVD_SENDMAIL_ESMTP_ID.replace_all(&value, " ").into_owned();
    value = RCVD_ID.replace_all(&value, " ").into_owned();
    value = RCVD_EXIM_ID.replace_all(&value, " ").into_owned();
    value = RCVD_DATE.replace_all(&value, "").into_owned();

    // keep the /24 only, except for private ranges which would be hapaxes
    value = RCVD_IPV4
        .replace_all(&value, |caps: &Captures| {
            let full = format!("{}.{}.{}.{}", &caps[1], &caps[2], &caps[3], &caps[4]);
            let private = &caps[1] == "10" || (&caps[1] == "192" && &caps[2] == "168");
            if private {
                format!("{} ip*{} ", full, full)
            } else {
                format!("{}.{}.{} ip*{} ", &caps[1], &caps[2], &caps[3], full)
            }
        })
        .into_owned();

    value = RCVD_WITH_PROTO.replace_all(&value, " ").into_owned();
    RCVD_CONNECTORS.replace_all(&value, " ").into_owned()
}

/// Fold the MIME boundary into a few low-cardinality tokens
pub fn chew_content_type(value: &str) -> String {
    let boundary = CT_BOUNDARY
        .captures_iter(value)
        .last()
        .map(|caps| caps[1].to_string());

    let mut value = CT_BOUNDARY.replace_all(value, " ").into_owned();

    if let Some(boundary) = boundary {
        let boundary = HEX_CHAR.replace_all(&boundary, "H");
        let boundary = BOUNDARY_SEPARATORS.replace_all(&boundary, " ${1} ");
        value.push_str(&boundary);
    }

    CT_STOP_WORDS.replace(&value, "").into_owned()
}

/// Every address in the value as `U*`/`D*` tokens
pub fn chew_addr_header(value: &str) -> String {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();

    for caps in ADDRESS_IN_LINE.captures_iter(value) {
        let addr = caps[1].trim_start_matches("mailto:");
        if !seen.insert(addr.to_string()) {
            continue;
        }
        tokens.extend(mail_addr_tokens(addr));
    }

    tokens.join(" ")
}

/// Bare addresses found in a header value, in order of appearance
pub fn find_addresses(value: &str) -> Vec<String> {
    let mut addrs: Vec<String> = Vec::new();
    for caps in ADDRESS_IN_LINE.captures_iter(value) {
        let addr = caps[1].trim_start_matches("mailto:").to_string();
        if !addrs.contains(&addr) {
            addrs.push(addr);
        }
    }
    addrs
}
