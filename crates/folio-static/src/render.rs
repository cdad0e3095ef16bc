//! View assembly and page rendering.

use folio_content::Page;
use serde_json::{Map, Value};

use crate::templates::{RenderError, TemplateEngine, Templates};

/// View key holding standalone pages, keyed by slug.
pub const PAGES_KEY: &str = "pages";

/// Group pages by collection.
///
/// Collection pages become ordered lists under the collection name.
/// Standalone pages are collected into a slug-keyed object under `pages`.
pub fn collections_view(pages: &[Page]) -> Result<Map<String, Value>, RenderError> {
    let mut collections: Map<String, Value> = Map::new();
    let mut standalone: Map<String, Value> = Map::new();

    for page in pages {
        let value = serde_json::to_value(page)?;

        match &page.collection {
            Some(name) => {
                let entry = collections
                    .entry(name.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(list) = entry {
                    list.push(value);
                }
            }
            None => {
                standalone.insert(page.slug.clone(), value);
            }
        }
    }

    if !standalone.is_empty() {
        if collections.contains_key(PAGES_KEY) {
            tracing::warn!(
                "Collection '{}' is hidden by standalone pages in the template view",
                PAGES_KEY
            );
        }
        collections.insert(PAGES_KEY.to_string(), Value::Object(standalone));
    }

    Ok(collections)
}

/// The view shared by every page of a build: configuration values with the
/// collections laid over them.
pub fn global_view(
    config_view: Map<String, Value>,
    pages: &[Page],
) -> Result<Map<String, Value>, RenderError> {
    let mut view = config_view;
    view.extend(collections_view(pages)?);
    Ok(view)
}

/// The view for one page.
///
/// Precedence, lowest first: the global view, `page`, then the page's own
/// variables.
pub fn page_view(
    global: &Map<String, Value>,
    page: &Page,
    variables: Map<String, Value>,
) -> Result<Value, RenderError> {
    let mut view = global.clone();
    view.insert("page".to_string(), serde_json::to_value(page)?);
    view.extend(variables);
    Ok(Value::Object(view))
}

/// Render one page.
///
/// The page's layout is used when it names a known layout; otherwise the
/// page content is the template. An unknown layout is not an error.
pub fn render_page(
    engine: &dyn TemplateEngine,
    page: &Page,
    view: &Value,
    layouts: &Templates,
    partials: &Templates,
) -> Result<String, RenderError> {
    let layout = page.layout.as_ref().and_then(|name| {
        let found = layouts.get(name);
        if found.is_none() {
            tracing::debug!("Layout '{}' not found for {}, using content", name, page.path);
        }
        found
    });

    let source = layout.unwrap_or(&page.content);
    engine.render(source, view, partials)
}
