//! Writing rendered pages and copied files into the destination tree.

use std::fs;
use std::path::{Component, Path, PathBuf};

use folio_content::Page;
use walkdir::WalkDir;

use crate::builder::BuildError;

/// File written for pages whose slug has no extension.
const INDEX_FILE: &str = "index.html";

/// Delete `dir` if present, then create it empty.
pub fn reset_dir(dir: &Path) -> Result<(), BuildError> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| BuildError::write(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| BuildError::write(dir, e))
}

/// Directory under `root` that holds a page's output.
///
/// `..` segments are rejected so a page can never write outside `root`.
pub fn page_dir(root: &Path, page_path: &str) -> Result<PathBuf, BuildError> {
    let relative = Path::new(page_path.trim_start_matches('/'));

    let mut dir = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => dir.push(segment),
            Component::CurDir => {}
            _ => return Err(BuildError::PathEscape(page_path.to_string())),
        }
    }

    Ok(dir)
}

/// Write a rendered page, copying its assets alongside.
///
/// Returns the path of the written file.
pub fn write_page(root: &Path, page: &Page, html: &str) -> Result<PathBuf, BuildError> {
    let dir = page_dir(root, &page.path)?;
    fs::create_dir_all(&dir).map_err(|e| BuildError::write(&dir, e))?;

    if let Some(assets) = &page.assets {
        if assets.exists() {
            copy_dir(assets, &dir)?;
        } else {
            tracing::warn!("Assets do not exist: {}", assets.display());
        }
    }

    let filename = if page.slug_has_extension() {
        Path::new(&page.slug)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(INDEX_FILE))
    } else {
        PathBuf::from(INDEX_FILE)
    };

    let output_path = dir.join(filename);
    fs::write(&output_path, html).map_err(|e| BuildError::write(&output_path, e))?;

    Ok(output_path)
}

/// Recursively copy the contents of `from` into `to`.
pub fn copy_dir(from: &Path, to: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;

    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(|e| BuildError::write(from, e.into()))?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BuildError::write(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| BuildError::write(&target, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}
