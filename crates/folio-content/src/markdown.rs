//! Markdown conversion and title extraction.

use std::sync::LazyLock;

use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

/// Converts markdown source into HTML.
pub trait MarkdownConverter: Send + Sync {
    /// Convert `markdown` to an HTML fragment.
    fn parse(&self, markdown: &str) -> String;
}

/// CommonMark converter backed by pulldown-cmark.
///
/// Raw HTML (including header comments) passes through untouched, so the
/// header block survives conversion.
#[derive(Debug, Clone)]
pub struct CommonMark {
    options: Options,
}

impl CommonMark {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl Default for CommonMark {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownConverter for CommonMark {
    fn parse(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);

        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        html_output
    }
}

static H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<h1>.*</h1>").expect("h1 pattern is valid"));

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a\s.*</a>").expect("anchor pattern is valid"));

/// Title of a rendered document: the text of its first `<h1>`.
///
/// Anchors inside the heading (permalink markers and the like) are removed.
pub fn title_from_html(html: &str) -> Option<String> {
    let heading = H1.find(html)?.as_str();
    let heading = ANCHOR.replace_all(heading, "");

    Some(heading.replacen("<h1>", "", 1).replacen("</h1>", "", 1))
}
