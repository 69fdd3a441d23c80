//! Type descriptors: per-type conversion, erased for storage.

use std::any::Any;
use std::sync::Arc;

use tracing::warn;

use crate::record::{ConfigRecord, RawRecord};

type ConvertFn = Box<dyn Fn(&RawRecord) -> Arc<dyn Any + Send + Sync> + Send + Sync>;
type ToJsonFn = Box<dyn Fn(&(dyn Any + Send + Sync)) -> Option<serde_json::Value> + Send + Sync>;

/// An erased converter for one registered record type.
///
/// Built once per registration: the type's field-binding table is captured
/// into a conversion closure, so converting a row is a straight walk over
/// precomputed bindings with no per-record introspection.
pub struct TypeDescriptor {
    name: &'static str,
    convert: ConvertFn,
    to_json: ToJsonFn,
}

impl TypeDescriptor {
    pub(crate) fn of<T: ConfigRecord>() -> Self {
        let name = T::config_name();
        let bindings = T::fields();
        let convert: ConvertFn = Box::new(move |record: &RawRecord| {
            let mut value = T::default();
            for binding in &bindings {
                let Some(cell) = binding.resolve(record) else {
                    continue;
                };
                if let Err(err) = binding.apply(&mut value, cell) {
                    warn!(
                        config = name,
                        field = binding.name(),
                        value = %cell,
                        error = %err,
                        "field conversion failed, keeping zero value"
                    );
                }
            }
            value.after_load();
            if let Err(reason) = value.validate() {
                warn!(config = name, reason = %reason, "record validation failed, record kept");
            }
            Arc::new(value) as Arc<dyn Any + Send + Sync>
        });
        let to_json: ToJsonFn = Box::new(|instance| {
            let record = instance.downcast_ref::<T>()?;
            serde_json::to_value(record).ok()
        });
        Self {
            name,
            convert,
            to_json,
        }
    }

    /// The config name this descriptor was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Converts one raw record into a typed instance. Field-level failures
    /// are logged and zeroed; conversion itself always produces a record.
    pub(crate) fn convert(&self, record: &RawRecord) -> Arc<dyn Any + Send + Sync> {
        (self.convert)(record)
    }

    /// Serializes an erased instance of this type for the debug export.
    pub(crate) fn to_json(&self, instance: &(dyn Any + Send + Sync)) -> Option<serde_json::Value> {
        (self.to_json)(instance)
    }
}
