//! Content model and discovery for folio sites.
//!
//! Turns a source tree into [`Page`] values: standalone pages found by
//! [`scan_pages`], dated collection entries from [`load_collection`], and
//! generated [`redirect_pages`]. Every page may carry a leading block of
//! `<!-- key: value -->` headers that override its computed fields.

pub mod collection;
pub mod error;
pub mod header;
pub mod helpers;
pub mod markdown;
pub mod page;
pub mod redirect;
pub mod scan;

pub use collection::{load_collection, CollectionSource, SLUG_PLACEHOLDER};
pub use error::ContentError;
pub use header::{extract_headers, Headers};
pub use helpers::BuildHelpers;
pub use markdown::{title_from_html, CommonMark, MarkdownConverter};
pub use page::Page;
pub use redirect::{redirect_pages, REDIRECTS_COLLECTION};
pub use scan::scan_pages;
