//! File watching with trailing debounce.
//!
//! Native notifications arrive in bursts (an editor save can produce half a
//! dozen). The [`Debouncer`] collapses each burst into a single change
//! signal once the source tree has been quiet for the debounce window.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Quiet period required before a change is signalled.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Lifecycle of a [`FileWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Not watching yet
    Idle,
    /// Watching and signalling changes
    Active,
    /// Watching, but changes are dropped
    Paused,
}

/// A raw notification from the platform watcher.
#[derive(Debug, Clone)]
pub enum RawEvent {
    /// Something under the watched root changed
    Changed,
    /// The watcher can no longer continue
    Failed(String),
}

/// Collapses bursts of raw events into single change signals.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    paused: Arc<AtomicBool>,
}

impl Debouncer {
    pub fn new(window: Duration, paused: Arc<AtomicBool>) -> Self {
        Self { window, paused }
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Consume `raw` on a background task.
    ///
    /// Each change resets the timer; when the window elapses without
    /// another change one signal is sent. The returned channel holds at most
    /// one pending signal and closes when `raw` closes or reports a failure.
    pub fn spawn(self, mut raw: mpsc::UnboundedReceiver<RawEvent>) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            loop {
                // Wait for the first change seen while not paused.
                match raw.recv().await {
                    None => return,
                    Some(RawEvent::Failed(message)) => {
                        tracing::error!("File watcher error: {}", message);
                        return;
                    }
                    Some(RawEvent::Changed) if self.is_paused() => continue,
                    Some(RawEvent::Changed) => {}
                }

                let mut deadline = Instant::now() + self.window;
                loop {
                    tokio::select! {
                        event = raw.recv() => match event {
                            None => return,
                            Some(RawEvent::Failed(message)) => {
                                tracing::error!("File watcher error: {}", message);
                                return;
                            }
                            Some(RawEvent::Changed) => {
                                if !self.is_paused() {
                                    deadline = Instant::now() + self.window;
                                }
                            }
                        },
                        _ = tokio::time::sleep_until(deadline) => break,
                    }
                }

                if self.is_paused() {
                    tracing::debug!("Dropping change detected while paused");
                    continue;
                }

                match tx.try_send(()) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {}
                    Err(mpsc::error::TrySendError::Closed(())) => return,
                }
            }
        });

        rx
    }
}

/// Recursive watcher over a source tree.
pub struct FileWatcher {
    root: PathBuf,
    debounce: Duration,
    paused: Arc<AtomicBool>,
    watcher: Option<RecommendedWatcher>,
}

impl FileWatcher {
    /// Create an idle watcher for `root`.
    pub fn new(root: impl Into<PathBuf>, debounce: Duration) -> Self {
        Self {
            root: root.into(),
            debounce,
            paused: Arc::new(AtomicBool::new(false)),
            watcher: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> WatchState {
        match (&self.watcher, self.paused.load(Ordering::SeqCst)) {
            (None, _) => WatchState::Idle,
            (Some(_), true) => WatchState::Paused,
            (Some(_), false) => WatchState::Active,
        }
    }

    /// Start watching. Must be called from within a tokio runtime.
    ///
    /// Returns the channel of debounced change signals. It closes when the
    /// watcher fails, for example because the root was removed.
    pub fn start(&mut self) -> Result<mpsc::Receiver<()>, notify::Error> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let root = self.root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let raw = match res {
                Ok(event) if removes_root(&event, &root) => {
                    RawEvent::Failed(format!("{} was removed", root.display()))
                }
                Ok(event) if is_content_change(&event) => RawEvent::Changed,
                Ok(_) => return,
                Err(e) => RawEvent::Failed(e.to_string()),
            };
            let _ = raw_tx.send(raw);
        })?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        let signals = Debouncer::new(self.debounce, Arc::clone(&self.paused)).spawn(raw_rx);
        self.watcher = Some(watcher);

        Ok(signals)
    }

    /// Stop signalling changes until [`FileWatcher::resume`].
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

/// Whether an event reflects a change to file contents or the tree.
///
/// Metadata-only modifications (atime, permissions) are noise.
fn is_content_change(event: &Event) -> bool {
    match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

fn removes_root(event: &Event, root: &Path) -> bool {
    matches!(event.kind, EventKind::Remove(_)) && event.paths.iter().any(|p| p == root)
}
