//! Watch mode for folio sites.
//!
//! Watches the source directory, rebuilds after each burst of changes and
//! pushes a reload event to browsers over server-sent events.

pub mod reload;
pub mod server;
pub mod session;
pub mod watcher;

pub use reload::{ReloadEvent, ReloadHub};
pub use server::{ReloadServerConfig, ServerError};
pub use session::{WatchOptions, WatchSession};
pub use watcher::{Debouncer, FileWatcher, WatchState};
