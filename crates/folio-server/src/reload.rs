//! Broadcasting reload events to connected browsers.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Delay between a finished build and the reload event.
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(300);

/// Events pushed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Full page reload
    Reload,
}

impl ReloadEvent {
    /// Name of the server-sent event frame.
    pub fn name(&self) -> &'static str {
        match self {
            ReloadEvent::Reload => "reload",
        }
    }
}

/// Hub for broadcasting reload events to all connected clients.
///
/// Clients that connect after an event was sent never see it.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadEvent>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Send an event to every current subscriber.
    pub fn send(&self, event: ReloadEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Broadcast [`ReloadEvent::Reload`] once `delay` has elapsed.
    pub fn reload(&self, delay: Duration) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(
                "Sending reload to {} client(s)",
                hub.subscriber_count()
            );
            hub.send(ReloadEvent::Reload);
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.sender.subscribe()
    }

    /// Number of connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
