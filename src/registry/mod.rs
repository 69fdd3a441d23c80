//! Type registry: config name → registered record type.

mod descriptor;

pub use descriptor::TypeDescriptor;

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::record::ConfigRecord;

/// Maps config names to the descriptors of their registered types.
///
/// Registration happens up front, before the first load; lookups happen on
/// every load pass. Re-registering a name replaces its descriptor (last
/// write wins). Names without a registration stay queryable as raw records.
#[derive(Default)]
pub struct TypeRegistry {
    types: DashMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under its config name.
    pub fn register<T: ConfigRecord>(&self) {
        let descriptor = TypeDescriptor::of::<T>();
        debug!(config = descriptor.name(), "record type registered");
        self.types
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
    }

    /// Looks up the descriptor registered for a config name.
    pub fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    /// Whether a type is registered under this name.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}
