//! Static site generation for folio.
//!
//! Runs one full build pass: reset the output directory, load templates and
//! configuration, gather pages, then render and write every one of them.

pub mod builder;
pub mod config;
pub mod output;
pub mod render;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, BuildStage, SiteBuilder};
pub use config::{ConfigError, ConfigLoader, DefaultConfig, SiteConfig, TomlConfigLoader};
pub use templates::{JinjaEngine, RenderError, TemplateEngine, Templates};
