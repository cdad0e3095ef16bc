//! Redirect pages.

use std::collections::BTreeMap;

use crate::page::Page;

/// Collection name reserved for generated redirects.
pub const REDIRECTS_COLLECTION: &str = "redirects";

/// Create one page per `from -> to` pair that sends visitors to `to`.
///
/// The page content is the complete document; no layout is applied.
pub fn redirect_pages(redirects: &BTreeMap<String, String>) -> Vec<Page> {
    redirects
        .iter()
        .map(|(from, to)| Page {
            title: Some(format!("Redirect to {}", to)),
            path: from.clone(),
            collection: Some(REDIRECTS_COLLECTION.to_string()),
            content: redirect_document(to),
            ..Default::default()
        })
        .collect()
}

fn redirect_document(to: &str) -> String {
    let to = escape_attribute(to);
    format!(
        r#"<link href="{to}" rel="canonical"><meta http-equiv="refresh" content="0;url={to}" />This page has moved. <a href="{to}">Click here if not redirected automatically.</a>"#
    )
}

/// Escape a URL for a double-quoted attribute. This crate has no template
/// engine, so minijinja's HTML escaping is out of reach here.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
