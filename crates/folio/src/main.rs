//! Folio CLI - static site builder with live reload.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Static site builder with live reload")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a site from a source directory
    Build {
        /// Source directory
        #[arg(allow_hyphen_values = true)]
        source: Option<String>,

        /// Destination directory, deleted before every build
        #[arg(allow_hyphen_values = true)]
        destination: Option<String>,

        /// Extra positional arguments, ignored
        #[arg(hide = true)]
        rest: Vec<String>,

        /// Rebuild on changes and notify browsers
        #[arg(short, long)]
        watch: bool,

        /// Delete an existing destination without asking
        #[arg(short, long)]
        force: bool,

        /// Port for the live reload endpoint
        #[arg(long, default_value = "5678")]
        port: u16,

        /// Milliseconds between a rebuild and the reload event
        #[arg(long, default_value = "300")]
        reload_delay: u64,

        /// Milliseconds of quiet before changes trigger a rebuild
        #[arg(long, default_value = "300")]
        debounce: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Build {
            source,
            destination,
            watch,
            force,
            port,
            reload_delay,
            debounce,
            rest,
        } => {
            if !rest.is_empty() {
                tracing::debug!("Ignoring extra arguments: {:?}", rest);
            }
            let args = commands::build::BuildArgs {
                source,
                destination,
                watch,
                force,
                port,
                reload_delay_ms: reload_delay,
                debounce_ms: debounce,
            };
            commands::build::run(args).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positionals(args: &[&str]) -> (Option<String>, Option<String>, bool) {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Build {
                source,
                destination,
                watch,
                ..
            } => (source, destination, watch),
        }
    }

    #[test]
    fn flag_like_source_reaches_validation() {
        let (source, destination, _) = positionals(&["folio", "build", "-x", "out"]);

        assert_eq!(source.as_deref(), Some("-x"));
        assert_eq!(destination.as_deref(), Some("out"));
    }

    #[test]
    fn flag_like_destination_reaches_validation() {
        let (source, destination, _) = positionals(&["folio", "build", "site", "--nope"]);

        assert_eq!(source.as_deref(), Some("site"));
        assert_eq!(destination.as_deref(), Some("--nope"));
    }

    #[test]
    fn known_flags_still_parse() {
        let (source, destination, watch) = positionals(&["folio", "build", "site", "out", "-w"]);

        assert_eq!(source.as_deref(), Some("site"));
        assert_eq!(destination.as_deref(), Some("out"));
        assert!(watch);
    }

    #[test]
    fn extra_arguments_are_accepted() {
        let (source, destination, _) = positionals(&["folio", "build", "site", "out", "extra"]);

        assert_eq!(source.as_deref(), Some("site"));
        assert_eq!(destination.as_deref(), Some("out"));
    }

    #[test]
    fn missing_arguments_are_left_to_validation() {
        let (source, destination, _) = positionals(&["folio", "build"]);

        assert_eq!(source, None);
        assert_eq!(destination, None);
    }
}
