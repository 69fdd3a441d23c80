//! The config engine: registration, loading, and the read surface.
//!
//! # Data Flow
//! ```text
//! ConfigEngine::new(settings)
//!     → register::<T>() for typed configs      (before first load)
//!     → load_all()                             (parallel, per file)
//!     → get_by_id / get_list / get_raw / ...   (lock-free reads)
//!     → watch()                                (hot reload in background)
//! ```
//!
//! # Design Decisions
//! - The engine is an explicit instance, cheap to clone and share; two
//!   engines never interfere, which keeps tests honest.
//! - Typed and raw access go through the same store; a name is typed when
//!   a type was registered for it before the load, raw otherwise.
//! - Bookkeeping (source paths, per-config load errors) lives beside the
//!   store, written concurrently by the parallel load tasks.

mod export;
mod loader;

pub use loader::LoadSummary;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use crate::observer::{ConfigObserver, ObserverHub};
use crate::reader::{FormatReader, ReaderSet, SheetDecoder, SheetReader, SourceFormat};
use crate::record::{parse_lenient_bool, ConfigRecord, KvRecord, RawRecord};
use crate::registry::TypeRegistry;
use crate::reload::{ReloadCoordinator, SourceWatcher, WatchHandle};
use crate::scan::{ScanError, SourceFile};
use crate::settings::{EngineSettings, SettingsError};
use crate::store::{ConfigStore, StoreSnapshot};

/// Errors surfaced by engine-level operations. Per-file and per-field
/// problems are journaled and logged instead; see
/// [`last_error`](ConfigEngine::last_error).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("failed to start file watcher: {0}")]
    WatchInit(#[from] notify::Error),
}

/// A hot-reloading store of typed tabular configs.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct ConfigEngine {
    inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) settings: EngineSettings,
    pub(crate) registry: TypeRegistry,
    pub(crate) store: ConfigStore,
    pub(crate) readers: ReaderSet,
    pub(crate) observers: ObserverHub,
    /// Config name → the file it was loaded from. Consulted by hot reload.
    pub(crate) sources: DashMap<String, SourceFile>,
    /// Config name → last load failure, cleared on the next success.
    pub(crate) load_errors: DashMap<String, String>,
    /// A load or reload pass is in flight.
    pub(crate) loading: AtomicBool,
    /// Completion time of the latest load or reload, in ms since the epoch.
    /// Zero means never loaded.
    pub(crate) last_load_ms: AtomicU64,
}

impl ConfigEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                settings,
                registry: TypeRegistry::new(),
                store: ConfigStore::new(),
                readers: ReaderSet::with_defaults(),
                observers: ObserverHub::default(),
                sources: DashMap::new(),
                load_errors: DashMap::new(),
                loading: AtomicBool::new(false),
                last_load_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Builds an engine from a TOML settings file.
    pub fn from_settings_file(path: impl AsRef<std::path::Path>) -> Result<Self, EngineError> {
        Ok(Self::new(EngineSettings::from_file(path)?))
    }

    /// Registers a record type under its config name. Call before the
    /// first load; files loaded earlier stay raw until the next load pass.
    pub fn register<T: ConfigRecord>(&self) {
        self.inner.registry.register::<T>();
    }

    /// Registers an observer for batch-change and first-load signals.
    pub fn register_observer(&self, observer: Arc<dyn ConfigObserver>) {
        self.inner.observers.register(observer);
    }

    /// Installs or replaces the reader for a format.
    pub fn register_reader(&self, format: SourceFormat, reader: Arc<dyn FormatReader>) {
        self.inner.readers.register(format, reader);
    }

    /// Enables `.xlsx`/`.xls` sources by installing a sheet decoder.
    pub fn register_sheet_decoder(&self, decoder: Arc<dyn SheetDecoder>) {
        self.inner
            .readers
            .register(SourceFormat::Sheet, Arc::new(SheetReader::new(decoder)));
    }

    /// Starts watching the root directory and hot-reloading changed
    /// configs. Returns immediately; reloads run on a background task
    /// until the returned handle is stopped or dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch(&self) -> Result<WatchHandle, EngineError> {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let exclude = self.inner.settings.exclude_files.iter().cloned().collect();
        let watcher = SourceWatcher::new(
            self.inner.settings.root_dir.clone(),
            exclude,
            change_tx,
        )
        .spawn()?;
        let coordinator = ReloadCoordinator::new(self.clone(), change_rx, shutdown_rx);
        tokio::spawn(coordinator.run());
        info!(root = %self.inner.settings.root_dir.display(), "hot reload watching");
        Ok(WatchHandle::new(watcher, shutdown_tx))
    }

    // ---- read surface -----------------------------------------------------

    /// Point lookup of a typed record.
    pub fn get_by_id<T: ConfigRecord>(&self, id: &str) -> Option<Arc<T>> {
        let snapshot = self.inner.store.snapshot();
        snapshot.get(T::config_name(), id)?.downcast::<T>()
    }

    /// All records of a typed config, in source row order.
    pub fn get_list<T: ConfigRecord>(&self) -> Vec<Arc<T>> {
        let snapshot = self.inner.store.snapshot();
        match snapshot.list(T::config_name()) {
            Some(list) => list.iter().filter_map(|entry| entry.downcast::<T>()).collect(),
            None => Vec::new(),
        }
    }

    /// Id → record map of a typed config. Built per call; hold on to it
    /// rather than calling in a tight loop.
    pub fn get_map<T: ConfigRecord>(&self) -> HashMap<String, Arc<T>> {
        let snapshot = self.inner.store.snapshot();
        match snapshot.id_index(T::config_name()) {
            Some(index) => index
                .iter()
                .filter_map(|(id, entry)| Some((id.clone(), entry.downcast::<T>()?)))
                .collect(),
            None => HashMap::new(),
        }
    }

    /// Point lookup of a raw record, for names without a registered type.
    pub fn get_raw(&self, name: &str, id: &str) -> Option<Arc<RawRecord>> {
        let snapshot = self.inner.store.snapshot();
        snapshot.get(name, id)?.as_raw().cloned()
    }

    /// All raw records of an unregistered config, in source row order.
    pub fn raw_list(&self, name: &str) -> Vec<Arc<RawRecord>> {
        let snapshot = self.inner.store.snapshot();
        match snapshot.list(name) {
            Some(list) => list
                .iter()
                .filter_map(|entry| entry.as_raw().cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    /// The current store generation, for advanced read patterns that need
    /// several lookups from one consistent view.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.inner.store.snapshot()
    }

    /// Whether any data is loaded under this config name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.store.snapshot().contains(name)
    }

    /// Number of records loaded under this config name.
    pub fn count(&self, name: &str) -> usize {
        self.inner.store.snapshot().count(name)
    }

    /// Sorted names of every loaded config.
    pub fn loaded_names(&self) -> Vec<String> {
        let snapshot = self.inner.store.snapshot();
        let mut names: Vec<String> = snapshot.names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Completion time of the latest load or reload.
    pub fn last_load_time(&self) -> Option<SystemTime> {
        let ms = self
            .inner
            .last_load_ms
            .load(std::sync::atomic::Ordering::SeqCst);
        if ms == 0 {
            return None;
        }
        Some(UNIX_EPOCH + Duration::from_millis(ms))
    }

    /// The last load failure recorded for a config name, if its most
    /// recent load did not succeed.
    pub fn last_error(&self, name: &str) -> Option<String> {
        self.inner
            .load_errors
            .get(name)
            .map(|entry| entry.value().clone())
    }

    // ---- key/value convenience --------------------------------------------

    /// The value of a key/value row, or `default` when the row is missing.
    pub fn kv_str<T: KvRecord>(&self, id: &str, default: &str) -> String {
        match self.get_by_id::<T>(id) {
            Some(row) => row.kv_value().to_string(),
            None => default.to_string(),
        }
    }

    /// The value of a key/value row as an integer; `default` when the row
    /// is missing or its value does not parse.
    pub fn kv_i64<T: KvRecord>(&self, id: &str, default: i64) -> i64 {
        self.get_by_id::<T>(id)
            .and_then(|row| row.kv_value().trim().parse().ok())
            .unwrap_or(default)
    }

    /// The value of a key/value row as a boolean, accepting the same
    /// spellings as field conversion.
    pub fn kv_bool<T: KvRecord>(&self, id: &str, default: bool) -> bool {
        self.get_by_id::<T>(id)
            .and_then(|row| parse_lenient_bool(row.kv_value().trim()))
            .unwrap_or(default)
    }

    /// The value of a key/value row split on commas, trimmed, empty pieces
    /// dropped. Missing rows give an empty vec.
    pub fn kv_csv<T: KvRecord>(&self, id: &str) -> Vec<String> {
        match self.get_by_id::<T>(id) {
            Some(row) => row
                .kv_value()
                .split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    // ---- crate-internal plumbing ------------------------------------------

    pub(crate) fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Whether hot reload knows a source file for this config name, i.e.
    /// it was loaded successfully at least once.
    pub(crate) fn has_source(&self, name: &str) -> bool {
        self.inner.sources.contains_key(name)
    }
}
