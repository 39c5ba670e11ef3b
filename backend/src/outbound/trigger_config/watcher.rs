//! Hot reload of the trigger table.
//!
//! The parent directory is watched rather than the file itself because
//! editors commonly replace files by rename, which drops a file watch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::loader::{TriggerConfigError, load_trigger_table};
use crate::domain::TriggerRegistry;

/// Quiet period letting a burst of write events settle before reloading.
const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Reload the table at `path` into `registry`.
///
/// On failure the registry keeps serving its previous table.
///
/// # Errors
///
/// Returns the loader error when the new table cannot be read or decoded.
pub async fn reload_triggers(
    path: &Path,
    registry: &TriggerRegistry,
) -> Result<usize, TriggerConfigError> {
    let table = load_trigger_table(path).await?;
    let count = table.len();
    registry.replace(table);
    Ok(count)
}

/// Background task reloading the trigger table whenever its file changes.
pub struct TriggerConfigWatcher {
    task: JoinHandle<()>,
}

impl TriggerConfigWatcher {
    /// Start watching `path`. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a notify error when the watch cannot be registered.
    pub fn spawn(path: PathBuf, registry: Arc<TriggerRegistry>) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>(64);
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.blocking_send(res);
        })?;

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        info!(path = %path.display(), "watching trigger table for changes");

        let task = tokio::spawn(watch_loop(watcher, rx, path, registry));
        Ok(Self { task })
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for TriggerConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn touches(event: &Event, file_name: Option<&OsString>) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    let Some(file_name) = file_name else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|changed| changed.file_name() == Some(file_name.as_os_str()))
}

async fn watch_loop(
    _watcher: RecommendedWatcher,
    mut rx: mpsc::Receiver<notify::Result<Event>>,
    path: PathBuf,
    registry: Arc<TriggerRegistry>,
) {
    let file_name = path.file_name().map(OsString::from);
    while let Some(event) = rx.recv().await {
        match event {
            Ok(event) if touches(&event, file_name.as_ref()) => {}
            Ok(_) => continue,
            Err(error) => {
                warn!(%error, "trigger table watcher error");
                continue;
            }
        }

        tokio::time::sleep(SETTLE_DELAY).await;
        while rx.try_recv().is_ok() {}

        match reload_triggers(&path, &registry).await {
            Ok(count) => info!(path = %path.display(), count, "trigger table reloaded"),
            Err(error) => warn!(%error, "trigger table reload failed; keeping previous table"),
        }
    }
    debug!("trigger table watcher stopped");
}
