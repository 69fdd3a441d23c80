//! Debug export: loaded configs mirrored to disk as JSON.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use super::ConfigEngine;
use crate::store::Entry;

#[derive(Debug, Error)]
enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ConfigEngine {
    /// Writes the current state of each named config into the export
    /// directory, one pretty-printed `<name>.json` per config. No-op when
    /// no export directory is configured; failures are logged and never
    /// affect the load.
    pub(crate) fn export_configs(&self, names: &[String]) {
        let Some(dir) = self.settings().export_dir.clone() else {
            return;
        };
        for name in names {
            if let Err(err) = self.export_one(&dir, name) {
                warn!(config = %name, error = %err, "debug export failed");
            }
        }
    }

    fn export_one(&self, dir: &Path, name: &str) -> Result<(), ExportError> {
        let snapshot = self.inner.store.snapshot();
        let Some(list) = snapshot.list(name) else {
            return Ok(());
        };

        let descriptor = self.inner.registry.lookup(name);
        let mut rows = Vec::with_capacity(list.len());
        for entry in list.iter() {
            match entry {
                Entry::Typed(instance) => {
                    let Some(descriptor) = &descriptor else {
                        continue;
                    };
                    match descriptor.to_json(instance.as_ref()) {
                        Some(row) => rows.push(row),
                        None => {
                            debug!(config = %name, "entry skipped in export, not serializable");
                        }
                    }
                }
                Entry::Raw(record) => rows.push(serde_json::to_value(record)?),
            }
        }

        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{name}.json"));
        let json = serde_json::to_string_pretty(&rows)?;
        fs::write(&path, json)?;
        debug!(config = %name, path = %path.display(), "debug export written");
        Ok(())
    }
}
