//! Build command.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use folio_server::{ReloadServerConfig, WatchOptions, WatchSession};
use folio_static::{BuildConfig, SiteBuilder};

/// Arguments of `folio build`.
#[derive(Debug)]
pub struct BuildArgs {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub watch: bool,
    pub force: bool,
    pub port: u16,
    pub reload_delay_ms: u64,
    pub debounce_ms: u64,
}

/// A positional path argument, rejected when missing or flag-like.
fn path_arg(arg: Option<&str>) -> Option<PathBuf> {
    match arg {
        Some(value) if !value.is_empty() && !value.starts_with('-') => Some(PathBuf::from(value)),
        _ => None,
    }
}

/// Ask before an existing destination is wiped. Only `yes` proceeds.
fn confirm_overwrite(
    destination: &Path,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<bool> {
    writeln!(
        output,
        "Warning: Destination path \"{}\" already exists.",
        destination.display()
    )?;
    write!(output, "It will be deleted, do you want to continue? [yes] ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(answer.trim_end_matches(['\r', '\n']) == "yes")
}

/// Run the build command.
///
/// Invalid arguments and a declined prompt are reported and end the command
/// without building.
pub async fn run(args: BuildArgs) -> Result<()> {
    let Some(source) = path_arg(args.source.as_deref()) else {
        println!("Error: Invalid source path.");
        return Ok(());
    };

    let Some(destination) = path_arg(args.destination.as_deref()) else {
        println!("Error: Invalid destination path.");
        return Ok(());
    };

    if !source.exists() {
        println!("Error: Source path \"{}\" does not exist.", source.display());
        return Ok(());
    }

    if destination.exists() && !args.force {
        let confirmed = confirm_overwrite(&destination, &mut io::stdin().lock(), &mut io::stdout())?;
        if !confirmed {
            println!("Aborting!");
            return Ok(());
        }
    }

    let builder = SiteBuilder::new(BuildConfig {
        source_dir: source,
        output_dir: destination,
    });

    tracing::info!("Building site...");
    let (builder, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = builder.build();
        (builder, outcome)
    })
    .await?;

    match outcome {
        Ok(result) => {
            tracing::info!("Built {} pages in {}ms", result.pages, result.duration_ms);
            tracing::info!("Output: {}", result.output_dir.display());
        }
        Err(e) => {
            tracing::error!("Build failed: {}", e);
            return Ok(());
        }
    }

    if args.watch {
        let options = WatchOptions {
            server: ReloadServerConfig {
                port: args.port,
                ..Default::default()
            },
            debounce: Duration::from_millis(args.debounce_ms),
            reload_delay: Duration::from_millis(args.reload_delay_ms),
        };

        WatchSession::new(builder, options).run().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn accepts_plain_paths() {
        assert_eq!(path_arg(Some("site")), Some(PathBuf::from("site")));
        assert_eq!(path_arg(Some("./out/dir")), Some(PathBuf::from("./out/dir")));
    }

    #[test]
    fn rejects_missing_and_flag_like_paths() {
        assert_eq!(path_arg(None), None);
        assert_eq!(path_arg(Some("")), None);
        assert_eq!(path_arg(Some("--watch")), None);
        assert_eq!(path_arg(Some("-w")), None);
    }

    #[test]
    fn only_yes_confirms() {
        let mut output = Vec::new();

        let confirmed =
            confirm_overwrite(Path::new("out"), &mut Cursor::new("yes\n"), &mut output).unwrap();

        assert!(confirmed);
        let prompt = String::from_utf8(output).unwrap();
        assert!(prompt.contains("Warning: Destination path \"out\" already exists."));
        assert!(prompt.ends_with("It will be deleted, do you want to continue? [yes] "));
    }

    #[test]
    fn anything_else_declines() {
        for answer in ["y\n", "YES\n", "\n", "", "yes please\n"] {
            let confirmed =
                confirm_overwrite(Path::new("out"), &mut Cursor::new(answer), &mut Vec::new())
                    .unwrap();
            assert!(!confirmed, "{:?} should not confirm", answer);
        }
    }

    #[tokio::test]
    async fn missing_source_builds_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let destination = temp.path().join("out");

        run(BuildArgs {
            source: Some(temp.path().join("nope").display().to_string()),
            destination: Some(destination.display().to_string()),
            watch: false,
            force: true,
            port: 0,
            reload_delay_ms: 0,
            debounce_ms: 0,
        })
        .await
        .unwrap();

        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn forced_build_replaces_destination() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("src");
        let destination = temp.path().join("out");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("config.toml"), "[pages]\n").unwrap();
        std::fs::write(source.join("about.md"), "# About").unwrap();
        std::fs::create_dir_all(&destination).unwrap();
        std::fs::write(destination.join("stale.html"), "old").unwrap();

        run(BuildArgs {
            source: Some(source.display().to_string()),
            destination: Some(destination.display().to_string()),
            watch: false,
            force: true,
            port: 0,
            reload_delay_ms: 0,
            debounce_ms: 0,
        })
        .await
        .unwrap();

        assert!(!destination.join("stale.html").exists());
        assert!(destination.join("about/index.html").exists());
    }
}
