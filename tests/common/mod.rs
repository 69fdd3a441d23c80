//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use confstore::{ConfigObserver, ConfigRecord, EngineSettings, FieldBinding, KvRecord};
use serde::Serialize;
use tokio::time::Instant;

/// Readable logs when a test run needs diagnosing: `RUST_LOG=debug`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confstore=info".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Settings with short reload timing so suites stay quick.
pub fn fast_settings(root: &Path) -> EngineSettings {
    let mut settings = EngineSettings::new(root);
    settings.batch_delay_ms = 150;
    settings.cooldown_ms = 100;
    settings
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// Polls `cond` until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    cond()
}

/// The typed face of `Item.json` / `Item.tsv` fixtures.
#[derive(Default, Serialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub enabled: bool,
}

impl ConfigRecord for Item {
    fn config_name() -> &'static str {
        "Item"
    }

    fn fields() -> Vec<FieldBinding<Self>> {
        vec![
            FieldBinding::str("id", |r, v| r.id = v),
            FieldBinding::str("name", |r, v| r.name = v),
            FieldBinding::i64("price", |r, v| r.price = v),
            FieldBinding::bool("enabled", |r: &mut Item, v| r.enabled = v).alias("Enabled"),
        ]
    }
}

/// Key/value table fixture.
#[derive(Default, Serialize)]
pub struct GlobalKv {
    pub id: String,
    pub value: String,
}

impl ConfigRecord for GlobalKv {
    fn config_name() -> &'static str {
        "GlobalKv"
    }

    fn fields() -> Vec<FieldBinding<Self>> {
        vec![
            FieldBinding::str("id", |r, v| r.id = v),
            FieldBinding::str("value", |r, v| r.value = v),
        ]
    }
}

impl KvRecord for GlobalKv {
    fn kv_value(&self) -> &str {
        &self.value
    }
}

/// Records every notification it receives.
#[derive(Default)]
pub struct CountingObserver {
    pub batches: Mutex<Vec<Vec<String>>>,
    pub stamps: Mutex<Vec<Instant>>,
    pub first_loads: AtomicUsize,
}

impl CountingObserver {
    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn last_batch(&self) -> Option<Vec<String>> {
        self.batches.lock().unwrap().last().cloned()
    }

    pub fn first_load_count(&self) -> usize {
        self.first_loads.load(Ordering::SeqCst)
    }

    /// Time between the notifications at positions `a` and `b`.
    pub fn gap(&self, a: usize, b: usize) -> Duration {
        let stamps = self.stamps.lock().unwrap();
        stamps[b] - stamps[a]
    }
}

impl ConfigObserver for CountingObserver {
    fn on_batch_change(&self, mut names: Vec<String>) {
        names.sort();
        self.batches.lock().unwrap().push(names);
        self.stamps.lock().unwrap().push(Instant::now());
    }

    fn on_first_load_done(&self) {
        self.first_loads.fetch_add(1, Ordering::SeqCst);
    }
}
