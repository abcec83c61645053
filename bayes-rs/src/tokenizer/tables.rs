//! Static tables used by the tokenizer

use once_cell::sync::Lazy;
use regex::Regex;

/// Words too common to carry evidence either way
pub static STOP_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^(?:
            a(?:ble|l(?:ready|l)|n[dy]|re)
            |b(?:ecause|oth)
            |c(?:an|ome)
            |e(?:ach|mail|ven)
            |f(?:ew|irst|or|rom)
            |give
            |h(?:a(?:ve|s)|ttp)
            |i(?:n(?:formation|to)|t's)
            |just
            |know
            |l(?:ike|o(?:ng|ok))
            |m(?:a(?:de|il(?:(?:ing|to))?|ke|ny)|o(?:re|st)|uch)
            |n(?:eed|o[tw]|umber)
            |o(?:ff|n(?:ly|e)|ut|wn)
            |p(?:eople|lace)
            |right
            |s(?:ame|ee|uch)
            |t(?:h(?:at|is|rough|e)|ime)
            |using
            |w(?:eb|h(?:ere|y)|ith(?:out)?|or(?:ld|k))
            |y(?:ears?|ou(?:(?:'re|r))?)
        )$",
    )
    .expect("stop word pattern is valid")
});

/// Headers that are noise: list management, other filters' verdicts,
/// mail client annotations and similar
pub static IGNORED_HEADERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)^(?:
            (?:X-)?Sender
            |Delivered-To |Delivery-Date
            |(?:X-)?Envelope-To
            |X-MIME-Auto[Cc]onverted |X-Converted-To-Plain-Text
            |Subject
            |Date
            |X-List |(?:X-)?Mailing-List
            |(?:X-)?List-(?:Archive|Help|Id|Owner|Post|Subscribe
                |Unsubscribe|Host|Manager|Admin|Comment|Name|Url)
            |X-Unsub(?:scribe)?
            |X-Mailman-Version |X-Been[Tt]here |X-Loop
            |Mail-Followup-To
            |X-eGroups-(?:Return|From)
            |X-MDMailing-List
            |X-XEmacs-List
            |X-Gateway
            |Errors-To
            |X-Original-To
            |X-MailScanner(?:-SpamCheck)?
            |X-Spam(?:-(?:Status|Level|Flag|Report|Hits|Score|Checker-Version))?
            |X-Antispam |X-RBL-Warning |X-Mailscanner
            |X-MDaemon-Deliver-To |X-Virus-Scanned
            |X-Mass-Check-Id
            |X-Pyzor |X-DCC-\S{2,25}-Metrics
            |X-Filtered-B[Yy] |X-Scanned-By |X-Scanner
            |X-AP-Spam-(?:Score|Status) |X-RIPE-Spam-Status
            |X-SpamCop-[^:]+
            |X-SMTPD |(?:X-)?Spam-Apparently-To
            |SPAM |X-Perlmx-Spam
            |X-Bogosity
            |Content-Class |Thread-(?:Index|Topic)
            |X-Original[Aa]rrival[Tt]ime
            |(?:X-)?Status |X-Flags |X-Keywords |Replied |Forwarded
            |Lines |Content-Length
            |X-UIDL? |X-IMAPbase
            |X-VM-(?:Bookmark|(?:POP|IMAP)-Retrieved|Labels|Last-Modified
                |Summary-Format|VHeader|v\d-Data|Message-Order)
            |X-Gnus-Mail-Source
            |Xref
        )$",
    )
    .expect("ignored header pattern is valid")
});

/// Headers reduced to a presence marker; their values are near-unique
pub static PRESENCE_ONLY_HEADERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)^(?:
            X-Face
            |X-(?:Gnu-?PG|PGP|GPG)(?:-Key)?-Fingerprint
            |D(?:KIM|omainKey)-Signature
        )$",
    )
    .expect("presence-only header pattern is valid")
});

/// Short codes for frequent header names
pub fn compress_header_name(name: &str) -> Option<&'static str> {
    let short = match name {
        "Message-Id" => "*m",
        "Message-ID" => "*M",
        "Received" => "*r",
        "User-Agent" => "*u",
        "References" => "*f",
        "In-Reply-To" => "*i",
        "From" => "*F",
        "Reply-To" => "*R",
        "Return-Path" => "*p",
        "Return-path" => "*rp",
        "X-Mailer" => "*x",
        "X-Authentication-Warning" => "*a",
        "Organization" | "Organisation" => "*o",
        "Content-Type" => "*c",
        "x-spam-relays-trusted" => "*RT",
        "x-spam-relays-untrusted" => "*RU",
        _ => return None,
    };
    Some(short)
}
