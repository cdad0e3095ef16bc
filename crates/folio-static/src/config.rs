//! Site configuration.
//!
//! A site is configured through three hooks: which pages to build, which
//! extra variables each page sees, and what to do once everything is
//! written. [`SiteConfig`] captures those hooks; [`ConfigLoader`] produces a
//! fresh one for every build so edits apply without a restart.
//!
//! The default loader reads `config.toml` from the source root:
//!
//! ```toml
//! [site]
//! title = "Example"
//!
//! [pages]
//! layout = "page"
//!
//! [[collections]]
//! name = "posts"
//! layout = "post"
//! source = "_posts"
//! path = "/blog/{{slug}}"
//!
//! [collections.variables]
//! comments = true
//!
//! [redirects]
//! "/old" = "/new"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use folio_content::{BuildHelpers, CollectionSource, ContentError, Page, REDIRECTS_COLLECTION};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::output::{copy_dir, page_dir};
use crate::render::PAGES_KEY;

/// Names the build uses for its own groupings in the template view.
const RESERVED_COLLECTIONS: &[&str] = &[PAGES_KEY, REDIRECTS_COLLECTION];

/// Configuration file looked up in the source root.
pub const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur while loading or running site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Configuration hook failed: {0}")]
    Hook(String),

    #[error("Collection name '{0}' is reserved")]
    ReservedCollection(String),
}

/// Hooks a site provides to the build.
///
/// Every method has a default: no pages, no extra variables, nothing after
/// the build.
pub trait SiteConfig: Send + Sync {
    /// Values added to the global view, such as `site`.
    fn view(&self) -> Map<String, Value> {
        Map::new()
    }

    /// All pages to build.
    fn pages(&self, _helpers: &BuildHelpers) -> Result<Vec<Page>, ConfigError> {
        Ok(Vec::new())
    }

    /// Extra variables for one page, overriding everything else in its view.
    fn page_variables(&self, _site: &Value, _page: &Page) -> Map<String, Value> {
        Map::new()
    }

    /// Runs after all pages are written, even when there were none.
    fn post_build(&self, _source: &Path, _destination: &Path) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Site configuration with every hook left at its default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConfig;

impl SiteConfig for DefaultConfig {}

/// Produces the configuration for one build.
pub trait ConfigLoader: Send + Sync {
    /// Load configuration for the site rooted at `source`.
    fn load(&self, source: &Path) -> Result<Box<dyn SiteConfig>, ConfigError>;
}

/// Loads `config.toml` from the source root, falling back to
/// [`DefaultConfig`] when it does not exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlConfigLoader;

impl ConfigLoader for TomlConfigLoader {
    fn load(&self, source: &Path) -> Result<Box<dyn SiteConfig>, ConfigError> {
        let path = source.join(CONFIG_FILE);

        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, source.display());
            return Ok(Box::new(DefaultConfig));
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let file: ConfigFile =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        if let Some(reserved) = file
            .collections
            .iter()
            .find(|c| RESERVED_COLLECTIONS.contains(&c.name.as_str()))
        {
            return Err(ConfigError::ReservedCollection(reserved.name.clone()));
        }

        tracing::debug!("Loaded config from {}", path.display());

        Ok(Box::new(FileConfig {
            root: source.to_path_buf(),
            file,
        }))
    }
}

/// Structure of `config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Free-form site values, exposed as `site`
    #[serde(default)]
    pub site: Map<String, Value>,

    /// Standalone page scanning; disabled when absent
    pub pages: Option<PagesSection>,

    #[serde(default)]
    pub collections: Vec<CollectionSection>,

    /// Generated files whose source is a template
    #[serde(default)]
    pub files: Vec<FileSection>,

    /// `from -> to` URL redirects
    #[serde(default)]
    pub redirects: BTreeMap<String, String>,

    /// Variables added to every page's view
    #[serde(default)]
    pub variables: Map<String, Value>,

    /// Directories copied verbatim after the build
    #[serde(default)]
    pub copy: Vec<CopySection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagesSection {
    /// Layout for scanned pages unless a header names another
    pub layout: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionSection {
    pub name: String,
    pub layout: Option<String>,
    /// Directory relative to the source root
    pub source: PathBuf,
    /// Output path template containing `{{slug}}`
    pub path: String,
    /// Variables for pages of this collection only
    #[serde(default)]
    pub variables: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSection {
    pub slug: String,
    #[serde(default = "default_file_path")]
    pub path: String,
    /// Template file relative to the source root
    pub source: PathBuf,
    pub layout: Option<String>,
    pub title: Option<String>,
}

fn default_file_path() -> String {
    "/".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopySection {
    /// Directory relative to the source root
    pub from: PathBuf,
    /// Directory relative to the destination root
    #[serde(default = "default_file_path")]
    pub to: String,
}

/// Site configuration read from `config.toml`.
#[derive(Debug)]
pub struct FileConfig {
    root: PathBuf,
    file: ConfigFile,
}

impl FileConfig {
    fn file_page(&self, section: &FileSection) -> Result<Page, ConfigError> {
        let path = self.root.join(&section.source);
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        Ok(Page {
            slug: section.slug.clone(),
            path: section.path.clone(),
            layout: section.layout.clone(),
            title: section.title.clone(),
            content,
            ..Default::default()
        })
    }
}

impl SiteConfig for FileConfig {
    fn view(&self) -> Map<String, Value> {
        let mut view = Map::new();
        view.insert("site".to_string(), Value::Object(self.file.site.clone()));
        view
    }

    fn pages(&self, helpers: &BuildHelpers) -> Result<Vec<Page>, ConfigError> {
        let mut pages = Vec::new();

        if let Some(section) = &self.file.pages {
            pages.extend(helpers.pages(&self.root, section.layout.as_deref())?);
        }

        for collection in &self.file.collections {
            let dir = self.root.join(&collection.source);
            pages.extend(helpers.collection(&CollectionSource {
                name: &collection.name,
                layout: collection.layout.as_deref(),
                dir: &dir,
                path_template: &collection.path,
            })?);
        }

        for file in &self.file.files {
            pages.push(self.file_page(file)?);
        }

        pages.extend(helpers.redirects(&self.file.redirects));

        Ok(pages)
    }

    fn page_variables(&self, _site: &Value, page: &Page) -> Map<String, Value> {
        let mut variables = self.file.variables.clone();

        if let Some(name) = &page.collection {
            if let Some(collection) = self.file.collections.iter().find(|c| &c.name == name) {
                variables.extend(collection.variables.clone());
            }
        }

        variables
    }

    fn post_build(&self, source: &Path, destination: &Path) -> Result<(), ConfigError> {
        for copy in &self.file.copy {
            let from = source.join(&copy.from);
            if !from.exists() {
                tracing::warn!("Copy source does not exist: {}", from.display());
                continue;
            }

            let to = page_dir(destination, &copy.to).map_err(|e| ConfigError::Hook(e.to_string()))?;
            let copied = copy_dir(&from, &to).map_err(|e| ConfigError::Hook(e.to_string()))?;
            tracing::debug!("Copied {} files from {}", copied, from.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();

        let config = TomlConfigLoader.load(temp.path()).unwrap();

        assert!(config.view().is_empty());
        assert!(config.pages(&BuildHelpers::default()).unwrap().is_empty());
        assert!(config
            .page_variables(&Value::Null, &Page::default())
            .is_empty());
        config.post_build(temp.path(), temp.path()).unwrap();
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        write(temp.path(), CONFIG_FILE, "[site\ntitle = ");

        let result = TomlConfigLoader.load(temp.path());

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let temp = tempdir().unwrap();
        write(temp.path(), CONFIG_FILE, "[colections]\nname = 'typo'\n");

        let result = TomlConfigLoader.load(temp.path());

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn reserved_collection_names_are_rejected() {
        for name in ["pages", "redirects"] {
            let temp = tempdir().unwrap();
            write(
                temp.path(),
                CONFIG_FILE,
                &format!("[[collections]]\nname = '{}'\nsource = '_x'\npath = '/{{{{slug}}}}'\n", name),
            );

            let result = TomlConfigLoader.load(temp.path());

            assert!(
                matches!(&result, Err(ConfigError::ReservedCollection(n)) if n == name),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn gathers_every_page_source() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            CONFIG_FILE,
            r#"
[site]
title = "Example"

[pages]
layout = "page"

[[collections]]
name = "posts"
layout = "post"
source = "_posts"
path = "/blog/{{slug}}"

[[files]]
slug = "feed.xml"
source = "_feeds/rss.xml"

[redirects]
"/old" = "/new"
"#,
        );
        write(temp.path(), "index.md", "# Home\n");
        write(temp.path(), "_posts/2024-01-05-hello.md", "# Hello\n");
        write(temp.path(), "_feeds/rss.xml", "<rss>{{ site.title }}</rss>");

        let config = TomlConfigLoader.load(temp.path()).unwrap();
        let pages = config.pages(&BuildHelpers::default()).unwrap();

        let summary: Vec<_> = pages
            .iter()
            .map(|p| (p.slug.as_str(), p.path.as_str(), p.collection.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("/index", "/", None),
                ("hello", "/blog/hello", Some("posts")),
                ("feed.xml", "/", None),
                ("", "/old", Some("redirects")),
            ]
        );
        assert_eq!(pages[0].layout.as_deref(), Some("page"));
        assert_eq!(config.view()["site"]["title"], "Example");
    }

    #[test]
    fn pages_table_enables_scanning() {
        let temp = tempdir().unwrap();
        write(temp.path(), CONFIG_FILE, "[site]\ntitle = 'x'\n");
        write(temp.path(), "index.md", "# Home\n");

        let config = TomlConfigLoader.load(temp.path()).unwrap();

        assert!(config.pages(&BuildHelpers::default()).unwrap().is_empty());
    }

    #[test]
    fn collection_variables_extend_global_ones() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            CONFIG_FILE,
            r#"
[variables]
comments = false
analytics = true

[[collections]]
name = "posts"
source = "_posts"
path = "/blog/{{slug}}"

[collections.variables]
comments = true
"#,
        );

        let config = TomlConfigLoader.load(temp.path()).unwrap();
        let post = Page {
            collection: Some("posts".to_string()),
            ..Default::default()
        };

        let standalone = config.page_variables(&Value::Null, &Page::default());
        let in_collection = config.page_variables(&Value::Null, &post);

        assert_eq!(standalone["comments"], json!(false));
        assert_eq!(in_collection["comments"], json!(true));
        assert_eq!(in_collection["analytics"], json!(true));
    }

    #[test]
    fn post_build_copies_directories() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        let out = temp.path().join("out");
        write(
            &source,
            CONFIG_FILE,
            "[[copy]]\nfrom = 'static'\nto = '/static'\n\n[[copy]]\nfrom = 'missing'\n",
        );
        write(&source, "static/css/site.css", "body {}");
        fs::create_dir_all(&out).unwrap();

        let config = TomlConfigLoader.load(&source).unwrap();
        config.post_build(&source, &out).unwrap();

        assert_eq!(
            fs::read_to_string(out.join("static/css/site.css")).unwrap(),
            "body {}"
        );
    }

    #[test]
    fn reloads_on_every_call() {
        let temp = tempdir().unwrap();
        write(temp.path(), CONFIG_FILE, "[site]\ntitle = 'First'\n");
        let first = TomlConfigLoader.load(temp.path()).unwrap();

        write(temp.path(), CONFIG_FILE, "[site]\ntitle = 'Second'\n");
        let second = TomlConfigLoader.load(temp.path()).unwrap();

        assert_eq!(first.view()["site"]["title"], "First");
        assert_eq!(second.view()["site"]["title"], "Second");
    }
}
