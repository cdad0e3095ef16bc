//! Collections built from a directory of dated entries.
//!
//! A collection directory holds entries in either of two shapes:
//!
//! ```text
//! _posts/
//! ├── 2024-01-05-hello/       # folder entry, the folder becomes `assets`
//! │   ├── index.md
//! │   └── photo.jpg
//! └── 2024-02-10-short.md     # flat entry, no assets
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use rayon::prelude::*;
use regex::Regex;

use crate::error::ContentError;
use crate::header::extract_headers;
use crate::markdown::{title_from_html, MarkdownConverter};
use crate::page::Page;

/// Placeholder in a collection's path template.
pub const SLUG_PLACEHOLDER: &str = "{{slug}}";

/// OS metadata files that never form entries.
const IGNORED_FILENAMES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(19[0-9]{2}|2[0-9]{3})-(0[1-9]|1[012])-([123]0|[012][1-9]|31)")
        .expect("date prefix pattern is valid")
});

/// Where to find a collection and where its pages go.
#[derive(Debug, Clone)]
pub struct CollectionSource<'a> {
    /// Collection name exposed to templates
    pub name: &'a str,

    /// Layout applied to every entry
    pub layout: Option<&'a str>,

    /// Directory holding the entries
    pub dir: &'a Path,

    /// Output path template, e.g. `/blog/{{slug}}`
    pub path_template: &'a str,
}

/// Build the pages of one collection.
///
/// Entries are visited in filename order. An entry whose markdown source is
/// missing (an empty folder, say) is skipped.
pub fn load_collection(
    source: &CollectionSource<'_>,
    converter: &dyn MarkdownConverter,
) -> Result<Vec<Page>, ContentError> {
    let mut filenames = Vec::new();
    for entry in fs::read_dir(source.dir).map_err(|e| ContentError::read(source.dir, e))? {
        let entry = entry.map_err(|e| ContentError::read(source.dir, e))?;
        let filename = entry.file_name().to_string_lossy().into_owned();

        if !IGNORED_FILENAMES.contains(&filename.as_str()) {
            filenames.push(filename);
        }
    }
    filenames.sort();

    let pages = filenames
        .par_iter()
        .map(|filename| load_entry(source, filename, converter))
        .collect::<Result<Vec<_>, _>>()?;

    let pages: Vec<Page> = pages.into_iter().flatten().collect();

    tracing::debug!(
        "Collection '{}' has {} entries from {}",
        source.name,
        pages.len(),
        source.dir.display()
    );

    Ok(pages)
}

fn load_entry(
    source: &CollectionSource<'_>,
    filename: &str,
    converter: &dyn MarkdownConverter,
) -> Result<Option<Page>, ContentError> {
    let entry_path = source.dir.join(filename);

    // Names without an extension are taken to be folders. An extensionless
    // file therefore resolves to `<file>/index.md` and is skipped.
    let is_directory = Path::new(filename).extension().is_none();
    let markdown_path = if is_directory {
        entry_path.join("index.md")
    } else {
        entry_path.clone()
    };

    if !markdown_path.exists() {
        tracing::debug!("Skipping {}: no markdown source", entry_path.display());
        return Ok(None);
    }

    let source_text =
        fs::read_to_string(&markdown_path).map_err(|e| ContentError::read(&markdown_path, e))?;
    let content = converter.parse(&source_text);
    let title = title_from_html(&content);
    let slug = slug_from_filename(filename);
    let assets: Option<PathBuf> = is_directory.then_some(entry_path);
    let (headers, content) = extract_headers(&content);

    let mut page = Page {
        path: source.path_template.replacen(SLUG_PLACEHOLDER, &slug, 1),
        slug,
        collection: Some(source.name.to_string()),
        layout: source.layout.map(str::to_string),
        title,
        date: date_from_filename(filename),
        content,
        assets,
        ..Default::default()
    };
    page.apply_headers(headers);

    Ok(Some(page))
}

/// The `YYYY-MM-DD` prefix of a filename, if it has one.
pub fn date_prefix(filename: &str) -> Option<&str> {
    DATE_PREFIX.find(filename).map(|m| m.as_str())
}

/// Date encoded in a filename prefix.
///
/// A prefix that matches the pattern but is not a calendar date
/// (`2023-02-31`) yields `None`.
pub fn date_from_filename(filename: &str) -> Option<NaiveDate> {
    let prefix = date_prefix(filename)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Filename with its date prefix and extension removed.
pub fn slug_from_filename(filename: &str) -> String {
    let undated = match date_prefix(filename) {
        Some(prefix) => filename
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .unwrap_or(filename),
        None => filename,
    };

    match Path::new(undated).extension().and_then(|e| e.to_str()) {
        Some(ext) => undated
            .strip_suffix(ext)
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap_or(undated)
            .to_string(),
        None => undated.to_string(),
    }
}
