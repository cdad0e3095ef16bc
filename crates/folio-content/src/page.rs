//! The page model shared by every stage of a build.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::header::Headers;

/// One unit of content destined for one output file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    /// URL-safe name, e.g. `my-cool-post` or `/about`
    pub slug: String,

    /// Output directory relative to the destination root
    pub path: String,

    /// Owning collection, `None` for standalone pages
    pub collection: Option<String>,

    /// Layout from `_layouts` wrapping the content
    pub layout: Option<String>,

    pub title: Option<String>,

    pub date: Option<NaiveDate>,

    /// HTML content with the header block removed
    pub content: String,

    /// Directory copied verbatim next to the rendered page
    pub assets: Option<PathBuf>,

    /// Header values that do not name a known field
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Page {
    /// Apply comment headers on top of the computed fields.
    ///
    /// Headers may override anything, including `slug`, `path` and `content`.
    pub fn apply_headers(&mut self, headers: Headers) {
        for (key, value) in headers {
            match key.as_str() {
                "slug" => self.slug = value,
                "path" => self.path = value,
                "collection" => self.collection = Some(value),
                "layout" => self.layout = Some(value),
                "title" => self.title = Some(value),
                "content" => self.content = value,
                "assets" => self.assets = Some(PathBuf::from(value)),
                "date" => {
                    self.date = match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
                        Ok(date) => Some(date),
                        Err(_) => {
                            tracing::warn!(
                                "Ignoring unparseable date header '{}' on {}",
                                value,
                                self.slug
                            );
                            None
                        }
                    };
                }
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }

    /// Whether the slug names a file (`feed.xml`) rather than a directory.
    pub fn slug_has_extension(&self) -> bool {
        std::path::Path::new(&self.slug).extension().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn headers_override_computed_fields() {
        let mut page = Page {
            slug: "hello".to_string(),
            title: Some("From H1".to_string()),
            layout: Some("post".to_string()),
            ..Default::default()
        };

        page.apply_headers(headers(&[("title", "Custom"), ("layout", "wide")]));

        assert_eq!(page.title.as_deref(), Some("Custom"));
        assert_eq!(page.layout.as_deref(), Some("wide"));
    }

    #[test]
    fn unknown_headers_land_in_extra() {
        let mut page = Page::default();

        page.apply_headers(headers(&[("description", "A post"), ("draft", "true")]));

        assert_eq!(page.extra.len(), 2);
        assert_eq!(page.extra["description"], "A post");
    }

    #[test]
    fn date_header_is_parsed() {
        let mut page = Page::default();

        page.apply_headers(headers(&[("date", "2021-03-04")]));

        assert_eq!(page.date, NaiveDate::from_ymd_opt(2021, 3, 4));
    }

    #[test]
    fn bad_date_header_clears_date() {
        let mut page = Page {
            date: NaiveDate::from_ymd_opt(2020, 1, 1),
            ..Default::default()
        };

        page.apply_headers(headers(&[("date", "yesterday")]));

        assert_eq!(page.date, None);
    }

    #[test]
    fn serializes_extra_fields_flat() {
        let mut page = Page {
            slug: "about".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5),
            ..Default::default()
        };
        page.extra.insert("author".to_string(), "Ada".to_string());

        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value["slug"], "about");
        assert_eq!(value["author"], "Ada");
        assert_eq!(value["date"], "2024-01-05");
        assert!(value["layout"].is_null());
    }

    #[test]
    fn detects_slug_extension() {
        let feed = Page {
            slug: "feed.xml".to_string(),
            ..Default::default()
        };
        let about = Page {
            slug: "about".to_string(),
            ..Default::default()
        };

        assert!(feed.slug_has_extension());
        assert!(!about.slug_has_extension());
    }
}
