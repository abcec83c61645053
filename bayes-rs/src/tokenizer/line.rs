//! Per-line tokenization shared by every region

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::tables::STOP_WORDS;

static DOT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)(\.{3,6})(\w)").expect("dot run pattern is valid"));
static DASH_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)(-{2,6})(\w)").expect("dash run pattern is valid"));
static TITLE_CASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\.\s+)([A-Z])([^A-Z]+)(?:\s|$)").expect("title case pattern is valid")
});
static MAIL_ADDR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S@\S").expect("address pattern is valid"));
static URI_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\S\.[a-z]").expect("domain pattern is valid"));

/// Minimum token length in chars
const MIN_TOKEN_LENGTH: usize = 3;

/// Chars kept from a long token that is replaced by a skip marker
const SKIP_TOKEN_KEEP: usize = 7;

/// Part of the message a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Header,
    Body,
    Uri,
}

impl Region {
    /// Numeric region code (0 = header, 1 = body, 2 = URI)
    pub fn code(self) -> u8 {
        match self {
            Region::Header => 0,
            Region::Body => 1,
            Region::Uri => 2,
        }
    }

    fn is_body_like(self) -> bool {
        matches!(self, Region::Body | Region::Uri)
    }

    /// Whether overlong tokens are shortened to a `sk:` marker
    fn long_tokens_as_skips(self) -> bool {
        match self {
            Region::Header | Region::Body => true,
            Region::Uri => false,
        }
    }
}

/// Splits one line of text into normalized token strings
#[derive(Debug, Clone)]
pub struct LineTokenizer {
    max_token_length: usize,
}

impl LineTokenizer {
    pub fn new(max_token_length: usize) -> Self {
        Self { max_token_length }
    }

    /// Tokenize `line`, appending the token strings to `out`
    pub fn tokenize(&self, line: &str, prefix: &str, region: Region, out: &mut Vec<String>) {
        let line = squeeze_line(line);
        let line = DOT_RUN.replace_all(&line, "${1} ${2} ${3}").into_owned();
        let line = DASH_RUN.replace_all(&line, "${1} ${2} ${3}").into_owned();

        let line = if region.is_body_like() {
            TITLE_CASE
                .replace_all(&line, |caps: &Captures| {
                    format!(" {}{} ", caps[1].to_lowercase(), &caps[2])
                })
                .into_owned()
        } else {
            line
        };

        for raw in line.split_whitespace() {
            let trimmed = raw.trim_matches(|c: char| matches!(c, '-' | '\'' | '"' | '.'));
            let len = trimmed.chars().count();

            if len < MIN_TOKEN_LENGTH || STOP_WORDS.is_match(trimmed) {
                continue;
            }

            if region.is_body_like() {
                if MAIL_ADDR.is_match(trimmed) {
                    out.extend(mail_addr_tokens(trimmed));
                } else if URI_DOMAIN.is_match(trimmed) {
                    out.push(format!("UD:{}", trimmed));
                    out.extend(domain_suffixes(trimmed).map(|bit| format!("UD:{}", bit)));
                }
            }

            let mut token = trimmed.to_string();

            // '*' marks split tokens such as "D*example.net"; keep them whole
            if len > self.max_token_length && !token.contains('*') {
                if has_wide_char_run(&token) {
                    let chars: Vec<char> = token.chars().collect();
                    for pair in chars.chunks(2) {
                        out.push(format!("{}8:{}", prefix, pair.iter().collect::<String>()));
                    }
                    continue;
                }

                if region.long_tokens_as_skips() {
                    token = format!("sk:{}", token.chars().take(SKIP_TOKEN_KEEP).collect::<String>());
                }
            }

            if region.is_body_like() {
                let decomposed = decompose(&token);
                if decomposed != token {
                    out.push(format!("{}{}", prefix, decomposed));
                }

                if token.chars().any(|c| c.is_ascii_uppercase()) {
                    let lower = token.to_lowercase();
                    let lower_decomposed = decompose(&lower);
                    if lower_decomposed != lower {
                        out.push(format!("{}{}", prefix, lower_decomposed));
                    }
                    out.push(format!("{}{}", prefix, lower));
                }
            }

            out.push(format!("{}{}", prefix, token));
        }
    }
}

/// Non-ASCII chars are all kept, so currency and marker signs such as
/// `£` or `©` stay part of the token
fn is_token_char(c: char) -> bool {
    !c.is_ascii()
        || c.is_ascii_alphanumeric()
        || c.is_ascii_whitespace()
        || matches!(c, '@' | '*' | '!' | '_' | '\'' | '"' | '.' | '$' | '-')
}

/// Replace every run of non-token chars with a single space
fn squeeze_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_gap = false;

    for c in line.chars() {
        if is_token_char(c) {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push(' ');
            in_gap = true;
        }
    }

    out
}

/// Two adjacent non-ASCII chars suggest a double-byte script
fn has_wide_char_run(token: &str) -> bool {
    let mut prev_wide = false;
    for c in token.chars() {
        let wide = !c.is_ascii();
        if wide && prev_wide {
            return true;
        }
        prev_wide = wide;
    }
    false
}

/// Keep only word chars, ':' and '*'
fn decompose(token: &str) -> String {
    token
        .chars()
        .filter(|&c| c.is_alphanumeric() || matches!(c, '_' | ':' | '*'))
        .collect()
}

/// Successive suffixes of a dotted name: "a.b.c" yields "b.c" then "c"
pub fn domain_suffixes(name: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(strip_first_label(name), |bit| strip_first_label(bit))
}

fn strip_first_label(name: &str) -> Option<&str> {
    let dot = name.find('.')?;
    if dot == 0 || dot + 1 >= name.len() {
        return None;
    }
    Some(&name[dot + 1..])
}

/// `U*local`, `D*domain` and every `D*` domain suffix of an address
pub fn mail_addr_tokens(addr: &str) -> Vec<String> {
    let Some((local, domain)) = addr.rsplit_once('@') else {
        return Vec::new();
    };
    if local.is_empty() || domain.is_empty() {
        return Vec::new();
    }

    let mut tokens = vec![format!("U*{}", local), format!("D*{}", domain)];
    tokens.extend(domain_suffixes(domain).map(|bit| format!("D*{}", bit)));
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(line: &str, prefix: &str, region: Region) -> Vec<String> {
        let mut out = Vec::new();
        LineTokenizer::new(15).tokenize(line, prefix, region, &mut out);
        out
    }

    #[test]
    fn test_region_codes() {
        assert_eq!(Region::Header.code(), 0);
        assert_eq!(Region::Body.code(), 1);
        assert_eq!(Region::Uri.code(), 2);
    }

    #[test]
    fn test_short_and_stop_words_dropped() {
        let tokens = run("an ox and the viagra", "", Region::Header);
        assert_eq!(tokens, vec!["viagra".to_string()]);
    }

    #[test]
    fn test_punctuation_trimmed_and_squeezed() {
        let tokens = run("\"cheap\", (pills)...", "", Region::Header);
        assert!(tokens.contains(&"cheap".to_string()));
        assert!(tokens.contains(&"pills".to_string()));
        assert!(!tokens.iter().any(|t| t.contains('(') || t.contains(',')));
    }

    #[test]
    fn test_non_ascii_signs_kept() {
        let tokens = run("Win £1000 now ©Acme", "", Region::Body);
        for expected in ["£1000", "1000", "©Acme", "©acme", "acme"] {
            assert!(tokens.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_ellipsis_splits_words() {
        // the separator becomes its own candidate, then trims to nothing
        let tokens = run("wait.....what", "", Region::Header);
        assert_eq!(tokens, vec!["wait".to_string(), "what".to_string()]);
    }

    #[test]
    fn test_body_title_case_lowered() {
        let tokens = run("Hello friend", "", Region::Body);
        assert!(tokens.contains(&"hello".to_string()));
        assert!(!tokens.contains(&"Hello".to_string()));
    }

    #[test]
    fn test_body_decomposition() {
        let tokens = run("buy CHEAP!!! now", "", Region::Body);
        assert!(tokens.contains(&"CHEAP!!!".to_string()));
        assert!(tokens.contains(&"CHEAP".to_string()));
        assert!(tokens.contains(&"cheap!!!".to_string()));
        assert!(tokens.contains(&"cheap".to_string()));
    }

    #[test]
    fn test_header_region_not_decomposed() {
        let tokens = run("CHEAP!!!", "Hx:", Region::Header);
        assert_eq!(tokens, vec!["Hx:CHEAP!!!".to_string()]);
    }

    #[test]
    fn test_body_mail_address() {
        let tokens = run("write to bob@example.com today", "", Region::Body);
        for expected in ["U*bob", "D*example.com", "D*com", "bob@example.com", "bobexamplecom"] {
            assert!(tokens.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_body_domain_suffixes() {
        let tokens = run("visit www.pills.biz", "", Region::Body);
        for expected in ["UD:www.pills.biz", "UD:pills.biz", "UD:biz", "www.pills.biz"] {
            assert!(tokens.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_long_token_skipped_in_body() {
        let tokens = run("supercalifragilistic", "", Region::Body);
        assert_eq!(tokens, vec!["sk:superca".to_string()]);
    }

    #[test]
    fn test_long_token_kept_in_uri_region() {
        let tokens = run("supercalifragilistic", "", Region::Uri);
        assert_eq!(tokens, vec!["supercalifragilistic".to_string()]);
    }

    #[test]
    fn test_long_token_with_star_kept() {
        let tokens = run("D*averyveryverylongdomain", "H*Ad:", Region::Header);
        assert_eq!(tokens, vec!["H*Ad:D*averyveryverylongdomain".to_string()]);
    }

    #[test]
    fn test_long_wide_run_exploded_into_tuples() {
        let tokens = run("日本語のテキストです日本語のテキストです", "", Region::Body);
        assert_eq!(tokens.len(), 10);
        assert_eq!(tokens[0], "8:日本");
        assert!(tokens.iter().all(|t| t.starts_with("8:")));
    }

    #[test]
    fn test_mail_addr_tokens() {
        assert_eq!(
            mail_addr_tokens("a@b.example.org"),
            vec!["U*a", "D*b.example.org", "D*example.org", "D*org"]
        );
        assert!(mail_addr_tokens("@example.org").is_empty());
        assert!(mail_addr_tokens("nobody").is_empty());
    }

    #[test]
    fn test_domain_suffixes_stop_on_empty_labels() {
        let bits: Vec<&str> = domain_suffixes("a..b").collect();
        assert_eq!(bits, vec![".b"]);
        assert_eq!(domain_suffixes("localhost").count(), 0);
    }
}
