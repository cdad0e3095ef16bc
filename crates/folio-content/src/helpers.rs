//! Page builders handed to site configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::collection::{load_collection, CollectionSource};
use crate::error::ContentError;
use crate::markdown::{CommonMark, MarkdownConverter};
use crate::page::Page;
use crate::redirect::redirect_pages;
use crate::scan::scan_pages;

/// The set of page builders available while assembling a site.
#[derive(Clone)]
pub struct BuildHelpers {
    converter: Arc<dyn MarkdownConverter>,
}

impl BuildHelpers {
    /// Create helpers that convert markdown with `converter`.
    pub fn new(converter: Arc<dyn MarkdownConverter>) -> Self {
        Self { converter }
    }

    /// Standalone pages found anywhere below `root`.
    pub fn pages(&self, root: &Path, layout: Option<&str>) -> Result<Vec<Page>, ContentError> {
        scan_pages(root, self.converter.as_ref(), layout)
    }

    /// Pages of the collection described by `source`.
    pub fn collection(&self, source: &CollectionSource<'_>) -> Result<Vec<Page>, ContentError> {
        load_collection(source, self.converter.as_ref())
    }

    /// Redirect pages for a `from -> to` map.
    pub fn redirects(&self, redirects: &BTreeMap<String, String>) -> Vec<Page> {
        redirect_pages(redirects)
    }

    /// The markdown converter in use.
    pub fn converter(&self) -> &dyn MarkdownConverter {
        self.converter.as_ref()
    }
}

impl Default for BuildHelpers {
    fn default() -> Self {
        Self::new(Arc::new(CommonMark::new()))
    }
}

impl std::fmt::Debug for BuildHelpers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildHelpers").finish_non_exhaustive()
    }
}
