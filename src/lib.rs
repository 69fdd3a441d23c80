//! Hot-reloading store for tabular game/service configuration data.
//!
//! Point an engine at a directory of spreadsheet/JSON/TSV files, register
//! the record types you care about, load once, and read lock-free from any
//! thread. A background watcher coalesces file edits into debounced reload
//! batches and tells your observers what changed.

pub mod engine;
pub mod observer;
pub mod reader;
pub mod record;
pub mod registry;
pub mod reload;
pub mod scan;
pub mod settings;
pub mod store;

pub use engine::{ConfigEngine, EngineError, LoadSummary};
pub use observer::ConfigObserver;
pub use reader::{
    FormatReader, JsonReader, ReadError, SheetDecoder, SheetReader, SourceFormat, TsvReader,
};
pub use record::{CellValue, CoerceError, ConfigRecord, FieldBinding, KvRecord, RawRecord};
pub use registry::{TypeDescriptor, TypeRegistry};
pub use reload::WatchHandle;
pub use scan::{ScanError, SourceFile};
pub use settings::{EngineSettings, SettingsError};
pub use store::{ConfigStore, Entry, IdIndex, ListIndex, StoreSnapshot};
