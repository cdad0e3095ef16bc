//! Comment header extraction.
//!
//! Pages carry their metadata as a run of HTML comments at the very top of
//! the content:
//!
//! ```text
//! <!-- title: Hello -->
//! <!-- layout: post -->
//! <p>Body starts here.</p>
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Header values keyed by header name. Later duplicates win.
pub type Headers = BTreeMap<String, String>;

static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s?(.+)\s?:\s?(.+)\s?-->").expect("header pattern is valid")
});

/// Split the leading header block off `content`.
///
/// Scanning stops at the first line that is not a header comment. The
/// remainder is every line from that point on, joined back with `\n`; when
/// no header is present it is the input, unchanged.
pub fn extract_headers(content: &str) -> (Headers, String) {
    let mut headers = Headers::new();
    let lines: Vec<&str> = content.split('\n').collect();

    let mut consumed = 0;
    for line in &lines {
        let Some(caps) = HEADER_LINE.captures(line) else {
            break;
        };

        headers.insert(caps[1].trim().to_string(), caps[2].trim().to_string());
        consumed += 1;
    }

    if consumed == 0 {
        return (headers, content.to_string());
    }

    (headers, lines[consumed..].join("\n"))
}
