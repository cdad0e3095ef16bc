//! Static site builder.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use folio_content::{BuildHelpers, MarkdownConverter, Page};
use serde_json::Value;

use crate::config::{ConfigError, ConfigLoader, TomlConfigLoader};
use crate::output::{reset_dir, write_page};
use crate::render::{global_view, page_view, render_page};
use crate::templates::{load_templates, JinjaEngine, RenderError, TemplateEngine};

/// Directory of partial templates in the source root.
pub const PARTIALS_DIR: &str = "_partials";

/// Directory of layout templates in the source root.
pub const LAYOUTS_DIR: &str = "_layouts";

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source content directory
    pub source_dir: PathBuf,

    /// Output directory, wiped at the start of every build
    pub output_dir: PathBuf,
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages written
    pub pages: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to load templates from {path}: {source}")]
    Templates {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to render {page}: {source}")]
    Render {
        page: String,
        #[source]
        source: RenderError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page path leaves the destination directory: {0}")]
    PathEscape(String),
}

impl BuildError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    fn render(page: &Page, source: RenderError) -> Self {
        let page = if page.slug.is_empty() {
            page.path.clone()
        } else {
            page.slug.clone()
        };
        Self::Render { page, source }
    }
}

/// Stages of one build pass, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Reset,
    LoadTemplates,
    LoadConfig,
    ScanPages,
    AssembleView,
    RenderAndWrite,
    PostBuild,
    Done,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reset => "reset",
            Self::LoadTemplates => "load templates",
            Self::LoadConfig => "load config",
            Self::ScanPages => "scan pages",
            Self::AssembleView => "assemble view",
            Self::RenderAndWrite => "render and write",
            Self::PostBuild => "post build",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Static site builder.
///
/// Every call to [`SiteBuilder::build`] is a full build from scratch: the
/// output directory is deleted, configuration is reloaded and every page is
/// rendered again.
pub struct SiteBuilder {
    config: BuildConfig,
    loader: Arc<dyn ConfigLoader>,
    engine: Arc<dyn TemplateEngine>,
    helpers: BuildHelpers,
}

impl SiteBuilder {
    /// Create a builder reading `config.toml` and rendering with minijinja.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            loader: Arc::new(TomlConfigLoader),
            engine: Arc::new(JinjaEngine::new()),
            helpers: BuildHelpers::default(),
        }
    }

    /// Use a different configuration loader.
    pub fn with_loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Use a different template engine.
    pub fn with_engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Use a different markdown converter.
    pub fn with_converter(mut self, converter: impl MarkdownConverter + 'static) -> Self {
        self.helpers = BuildHelpers::new(Arc::new(converter));
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the site.
    ///
    /// Errors abort the build and leave the output directory as it was at
    /// that point.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let source = self.config.source_dir.as_path();
        let output = self.config.output_dir.as_path();

        if !source.is_dir() {
            return Err(BuildError::SourceMissing(source.to_path_buf()));
        }

        enter(BuildStage::Reset);
        reset_dir(output)?;

        enter(BuildStage::LoadTemplates);
        let partials = read_templates(&source.join(PARTIALS_DIR))?;
        let layouts = read_templates(&source.join(LAYOUTS_DIR))?;

        enter(BuildStage::LoadConfig);
        let site_config = self.loader.load(source)?;

        enter(BuildStage::ScanPages);
        let pages = site_config.pages(&self.helpers)?;

        enter(BuildStage::AssembleView);
        let global = global_view(site_config.view(), &pages).map_err(|source| {
            BuildError::Render {
                page: "global view".to_string(),
                source,
            }
        })?;
        let site = global.get("site").cloned().unwrap_or(Value::Null);

        enter(BuildStage::RenderAndWrite);
        let mut written = HashSet::new();
        for page in &pages {
            let variables = site_config.page_variables(&site, page);
            let html = page_view(&global, page, variables)
                .and_then(|view| {
                    render_page(self.engine.as_ref(), page, &view, &layouts, &partials)
                })
                .map_err(|source| BuildError::render(page, source))?;

            let path = write_page(output, page, &html)?;
            if !written.insert(path.clone()) {
                tracing::debug!("Overwrote {} (duplicate slug)", path.display());
            }
        }

        enter(BuildStage::PostBuild);
        site_config.post_build(source, output)?;

        enter(BuildStage::Done);

        Ok(BuildResult {
            pages: written.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: output.to_path_buf(),
        })
    }
}

fn enter(stage: BuildStage) {
    tracing::debug!("Build stage: {}", stage);
}

fn read_templates(dir: &Path) -> Result<crate::templates::Templates, BuildError> {
    load_templates(dir).map_err(|source| BuildError::Templates {
        path: dir.to_path_buf(),
        source,
    })
}
