//! Load passes: parallel initial loads and serial hot-reload batches.

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use tracing::{error, info, warn};

use super::{ConfigEngine, EngineError};
use crate::reader::SourceFormat;
use crate::record::RawRecord;
use crate::scan::{self, SourceFile};
use crate::store::{Entry, IdIndex, ListIndex};

/// What a completed load pass touched.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    /// Config names loaded (or reloaded) successfully.
    pub loaded: Vec<String>,
    /// Config names whose file failed to read or parse.
    pub failed: Vec<String>,
}

/// Outcome of loading one source file.
enum LoadOutcome {
    Loaded,
    Failed,
    /// Not an error: the file's format has no reader registered.
    Skipped,
}

impl ConfigEngine {
    /// Scans the root directory and loads every recognized source file,
    /// one parallel task per file.
    ///
    /// Only a failed directory walk fails the pass as a whole. Individual
    /// file failures are journaled (see
    /// [`last_error`](ConfigEngine::last_error)) and reported in the
    /// summary; sibling files load regardless.
    pub async fn load_all(&self) -> Result<LoadSummary, EngineError> {
        let exclude: HashSet<String> = self.settings().exclude_files.iter().cloned().collect();
        let files = scan::scan_dir(&self.settings().root_dir, &exclude)?;
        info!(
            root = %self.settings().root_dir.display(),
            files = files.len(),
            "loading configs"
        );

        self.inner.loading.store(true, Ordering::SeqCst);
        let summary = self.load_files(files).await;
        self.stamp_load_time();
        self.inner.loading.store(false, Ordering::SeqCst);

        self.export_configs(&summary.loaded);
        self.inner.observers.notify_batch(&summary.loaded);
        self.inner.observers.notify_first_load();

        info!(
            loaded = summary.loaded.len(),
            failed = summary.failed.len(),
            "load pass complete"
        );
        Ok(summary)
    }

    /// Fans one blocking task out per file and collects the results.
    async fn load_files(&self, files: Vec<SourceFile>) -> LoadSummary {
        let mut tasks = Vec::with_capacity(files.len());
        for file in files {
            let engine = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                let name = file.name.clone();
                let outcome = engine.load_one(&file);
                (name, outcome)
            }));
        }

        let mut summary = LoadSummary::default();
        for joined in join_all(tasks).await {
            match joined {
                Ok((name, LoadOutcome::Loaded)) => summary.loaded.push(name),
                Ok((name, LoadOutcome::Failed)) => summary.failed.push(name),
                Ok((_, LoadOutcome::Skipped)) => {}
                Err(err) => error!(error = %err, "load task panicked"),
            }
        }
        summary.loaded.sort();
        summary.failed.sort();
        summary
    }

    /// Reads, converts, and publishes one source file.
    fn load_one(&self, file: &SourceFile) -> LoadOutcome {
        let Some(reader) = self.inner.readers.get(file.format) else {
            warn!(
                config = %file.name,
                format = file.format.as_str(),
                "no reader registered for format, skipping"
            );
            return LoadOutcome::Skipped;
        };

        match reader.read(&file.name, &file.path) {
            Ok(records) => {
                let count = records.len();
                let (ids, list) = self.build_indexes(&file.name, file.format, records);
                self.inner.store.install(&file.name, ids, list);
                self.inner.sources.insert(file.name.clone(), file.clone());
                self.inner.load_errors.remove(&file.name);
                info!(config = %file.name, records = count, "config loaded");
                LoadOutcome::Loaded
            }
            Err(err) => {
                error!(
                    config = %file.name,
                    path = %file.path.display(),
                    error = %err,
                    "config load failed"
                );
                self.inner
                    .load_errors
                    .insert(file.name.clone(), err.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Converts raw records and builds the per-name id index and list.
    ///
    /// Records without a resolvable id land in the list only; duplicate
    /// ids keep the last occurrence, mirroring how a row edit overrides an
    /// earlier row.
    fn build_indexes(
        &self,
        name: &str,
        format: SourceFormat,
        records: Vec<RawRecord>,
    ) -> (IdIndex, ListIndex) {
        let descriptor = self.inner.registry.lookup(name);
        let fallback = format.id_fallback();

        let mut ids = IdIndex::with_capacity(records.len());
        let mut list = ListIndex::with_capacity(records.len());
        for record in records {
            let id = record.id(fallback);
            let entry = match &descriptor {
                Some(descriptor) => Entry::Typed(descriptor.convert(&record)),
                None => Entry::Raw(Arc::new(record)),
            };
            list.push(entry.clone());
            if let Some(id) = id {
                ids.insert(id, entry);
            }
        }
        (ids, list)
    }

    /// Reloads the named configs serially through their recorded sources.
    ///
    /// Returns `false` without touching anything when another load pass
    /// holds the in-flight flag; the caller re-queues the batch. Names
    /// with no recorded source (never loaded) are dropped from the batch.
    pub(crate) async fn try_reload_batch(&self, names: &[String]) -> bool {
        if self
            .inner
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let mut reloaded = Vec::new();
        for name in names {
            let Some(source) = self
                .inner
                .sources
                .get(name)
                .map(|entry| entry.value().clone())
            else {
                continue;
            };
            let engine = self.clone();
            match tokio::task::spawn_blocking(move || engine.load_one(&source)).await {
                Ok(LoadOutcome::Loaded) => reloaded.push(name.clone()),
                Ok(_) => {}
                Err(err) => error!(config = %name, error = %err, "reload task panicked"),
            }
        }

        self.stamp_load_time();
        self.inner.loading.store(false, Ordering::SeqCst);

        self.export_configs(&reloaded);
        self.inner.observers.notify_batch(&reloaded);
        info!(reloaded = reloaded.len(), "hot reload batch complete");
        true
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Time left before the cooldown interval since the last completed
    /// load elapses; `None` once it already has.
    pub(crate) fn cooldown_remaining(&self) -> Option<Duration> {
        let last = self.inner.last_load_ms.load(Ordering::SeqCst);
        if last == 0 {
            return None;
        }
        let now = epoch_millis();
        let elapsed = now.saturating_sub(last);
        let cooldown = self.settings().cooldown_ms;
        if elapsed < cooldown {
            Some(Duration::from_millis(cooldown - elapsed))
        } else {
            None
        }
    }

    fn stamp_load_time(&self) {
        self.inner
            .last_load_ms
            .store(epoch_millis(), Ordering::SeqCst);
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
