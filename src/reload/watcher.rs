//! Filesystem watcher: change events → config names on a channel.

use std::collections::HashSet;
use std::path::PathBuf;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::scan;

/// Watches the config root and forwards the config name of every relevant
/// write or create event. Filtering happens here, on the watcher's own
/// callback thread, so editor scratch noise never wakes the coordinator.
pub(crate) struct SourceWatcher {
    root: PathBuf,
    exclude: HashSet<String>,
    change_tx: mpsc::UnboundedSender<String>,
}

impl SourceWatcher {
    pub(crate) fn new(
        root: PathBuf,
        exclude: HashSet<String>,
        change_tx: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            root,
            exclude,
            change_tx,
        }
    }

    /// Starts watching recursively. The returned watcher must stay alive
    /// for events to keep flowing; dropping it releases the watch.
    pub(crate) fn spawn(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx;
        let exclude = self.exclude;
        let mut watcher =
            notify::recommended_watcher(move |event: Result<Event, notify::Error>| {
                match event {
                    Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                        for path in &event.paths {
                            let Some(file) = scan::classify(path.clone(), &exclude) else {
                                continue;
                            };
                            debug!(config = %file.name, "source file changed");
                            let _ = tx.send(file.name);
                        }
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "file watcher error"),
                }
            })?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        Ok(watcher)
    }
}
