//! Standalone page discovery.

use std::fs;
use std::path::{Component, Path};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::ContentError;
use crate::header::extract_headers;
use crate::markdown::{title_from_html, MarkdownConverter};
use crate::page::Page;

/// File extensions treated as page sources.
const PAGE_EXTENSIONS: &[&str] = &["md", "html"];

/// Slug of the site's front page.
const ROOT_INDEX: &str = "/index";

/// Find every standalone page below `root`.
///
/// Markdown and HTML files are pages unless any segment of their path below
/// `root` starts with `_`; those are reserved for layouts, partials and
/// collections. Pages come back sorted by slug.
pub fn scan_pages(
    root: &Path,
    converter: &dyn MarkdownConverter,
    layout: Option<&str>,
) -> Result<Vec<Page>, ContentError> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| ContentError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if is_page_source(relative) {
            sources.push(entry.into_path());
        }
    }

    tracing::debug!("Found {} page sources in {}", sources.len(), root.display());

    let mut pages = sources
        .par_iter()
        .map(|path| load_page(root, path, converter, layout))
        .collect::<Result<Vec<_>, _>>()?;

    pages.sort_by(|a, b| a.slug.cmp(&b.slug));

    Ok(pages)
}

/// Whether a root-relative path is a page source.
fn is_page_source(relative: &Path) -> bool {
    let has_page_extension = relative
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext));

    has_page_extension && !is_reserved(relative)
}

/// Whether any segment of the path starts with `_`.
fn is_reserved(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('_'),
        _ => false,
    })
}

/// `/`-prefixed slug from a root-relative path without its extension.
fn slug_for(relative: &Path) -> String {
    let stem = relative.with_extension("");
    let segments: Vec<String> = stem
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    format!("/{}", segments.join("/"))
}

fn load_page(
    root: &Path,
    path: &Path,
    converter: &dyn MarkdownConverter,
    layout: Option<&str>,
) -> Result<Page, ContentError> {
    let source = fs::read_to_string(path).map_err(|e| ContentError::read(path, e))?;

    let is_markdown = path.extension().is_some_and(|ext| ext == "md");
    let content = if is_markdown {
        converter.parse(&source)
    } else {
        source
    };

    let relative = path.strip_prefix(root).unwrap_or(path);
    let slug = slug_for(relative);
    let page_path = if slug == ROOT_INDEX {
        "/".to_string()
    } else {
        slug.clone()
    };

    let title = title_from_html(&content);
    let (headers, content) = extract_headers(&content);

    let mut page = Page {
        slug,
        path: page_path,
        layout: layout.map(str::to_string),
        title,
        content,
        ..Default::default()
    };
    page.apply_headers(headers);

    Ok(page)
}
