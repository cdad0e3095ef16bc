//! Watch mode: rebuild on change, then tell browsers to reload.

use std::sync::Arc;
use std::time::Duration;

use folio_static::SiteBuilder;
use tokio::sync::mpsc;

use crate::reload::{ReloadHub, DEFAULT_RELOAD_DELAY};
use crate::server::{self, ReloadServerConfig, ServerError};
use crate::watcher::{FileWatcher, DEFAULT_DEBOUNCE};

/// Settings for a [`WatchSession`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Where the reload endpoint listens
    pub server: ReloadServerConfig,

    /// Quiet period before a burst of changes triggers a build
    pub debounce: Duration,

    /// Delay between a finished build and the reload event
    pub reload_delay: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            server: ReloadServerConfig::default(),
            debounce: DEFAULT_DEBOUNCE,
            reload_delay: DEFAULT_RELOAD_DELAY,
        }
    }
}

/// Long-running rebuild loop over a site's source directory.
pub struct WatchSession {
    builder: Arc<SiteBuilder>,
    hub: ReloadHub,
    options: WatchOptions,
}

impl WatchSession {
    pub fn new(builder: SiteBuilder, options: WatchOptions) -> Self {
        Self {
            builder: Arc::new(builder),
            hub: ReloadHub::new(),
            options,
        }
    }

    pub fn hub(&self) -> &ReloadHub {
        &self.hub
    }

    /// Serve reload events and rebuild on every change.
    ///
    /// If the watcher stops, for example because the source directory was
    /// removed, rebuilding ends but the reload endpoint keeps serving.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = server::bind(&self.options.server).await?;
        let server = tokio::spawn(server::serve(listener, self.hub.clone()));

        self.watch().await?;

        match server.await {
            Ok(result) => result,
            Err(e) => Err(ServerError::Serve(e.to_string())),
        }
    }

    /// Rebuild on every change until the watcher stops.
    pub async fn watch(&self) -> Result<(), ServerError> {
        let mut watcher =
            FileWatcher::new(&self.builder.config().source_dir, self.options.debounce);
        let signals = watcher.start()?;

        tracing::info!("Watching {} for changes", watcher.root().display());
        self.rebuild_on_change(&watcher, signals).await;
        tracing::warn!("Stopped watching {}", watcher.root().display());

        Ok(())
    }

    async fn rebuild_on_change(&self, watcher: &FileWatcher, mut signals: mpsc::Receiver<()>) {
        while signals.recv().await.is_some() {
            watcher.pause();
            tracing::info!("Change detected, rebuilding");

            let builder = Arc::clone(&self.builder);
            match tokio::task::spawn_blocking(move || builder.build()).await {
                Ok(Ok(result)) => {
                    tracing::info!("Built {} pages in {}ms", result.pages, result.duration_ms);
                }
                Ok(Err(e)) => tracing::error!("Build failed: {}", e),
                Err(e) => tracing::error!("Build task failed: {}", e),
            }

            self.hub.reload(self.options.reload_delay);
            watcher.resume();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::ReloadEvent;
    use folio_static::BuildConfig;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn change_rebuilds_and_reloads() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        let output = temp.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("config.toml"), "[pages]\n").unwrap();
        fs::write(source.join("index.md"), "# First").unwrap();

        let builder = SiteBuilder::new(BuildConfig {
            source_dir: source.clone(),
            output_dir: output.clone(),
        });
        builder.build().unwrap();

        let session = Arc::new(WatchSession::new(
            builder,
            WatchOptions {
                debounce: Duration::from_millis(50),
                reload_delay: Duration::from_millis(10),
                ..Default::default()
            },
        ));
        let mut reloads = session.hub().subscribe();

        let running = Arc::clone(&session);
        tokio::spawn(async move { running.watch().await });

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(source.join("index.md"), "# Second").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), reloads.recv())
            .await
            .expect("timeout waiting for reload")
            .unwrap();

        assert_eq!(event, ReloadEvent::Reload);
        let html = fs::read_to_string(output.join("index.html")).unwrap();
        assert!(html.contains("Second"));
    }
}
