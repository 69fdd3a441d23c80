//! Record model: cell values, raw rows, and the typed-record contract.
//!
//! # Data Flow
//! ```text
//! source file
//!     → format reader (rows of CellValue, keyed by column name)
//!     → RawRecord (ordered column map)
//!     → FieldBinding table (declared once per type)
//!     → typed instance (Default + per-field coercion)
//!     → after_load / validate hooks
//! ```
//!
//! # Design Decisions
//! - Field mapping is declared as data, not derived per record: a type's
//!   binding table is built once at registration and reused for every row.
//! - The setter enum closes the set of convertible field types; anything
//!   outside it cannot be expressed, so conversion never hits an
//!   "unsupported kind" branch at runtime.
//! - Conversion failures zero the field and keep the record.

mod raw;
mod value;

pub use raw::RawRecord;
pub use value::{CellValue, CoerceError};

pub(crate) use value::parse_lenient_bool;

use serde::Serialize;

/// A typed configuration record.
///
/// Implementors describe one logical config table: the config name ties the
/// type to a source file base name, and [`fields`](ConfigRecord::fields)
/// declares how columns populate the struct.
///
/// ```
/// use confstore::{ConfigRecord, FieldBinding};
/// use serde::Serialize;
///
/// #[derive(Default, Serialize)]
/// struct Item {
///     id: String,
///     name: String,
///     price: i64,
///     enabled: bool,
/// }
///
/// impl ConfigRecord for Item {
///     fn config_name() -> &'static str {
///         "Item"
///     }
///
///     fn fields() -> Vec<FieldBinding<Self>> {
///         vec![
///             FieldBinding::str("id", |r, v| r.id = v),
///             FieldBinding::str("name", |r, v| r.name = v),
///             FieldBinding::i64("price", |r, v| r.price = v),
///             FieldBinding::bool("enabled", |r: &mut Item, v| r.enabled = v).alias("Enabled"),
///         ]
///     }
/// }
/// ```
pub trait ConfigRecord: Default + Serialize + Send + Sync + 'static {
    /// Logical config name; matches the source file base name.
    fn config_name() -> &'static str;

    /// The field-binding table. Called once, at registration.
    fn fields() -> Vec<FieldBinding<Self>>
    where
        Self: Sized;

    /// Runs once per record, after all fields are populated. Derived
    /// fields and cross-references belong here.
    fn after_load(&mut self) {}

    /// Advisory consistency check, run after `after_load`. A failure is
    /// logged with the returned reason; the record stays indexed.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A record with a conventional key/value shape, unlocking the engine's
/// `kv_*` accessors.
pub trait KvRecord: ConfigRecord {
    /// The value cell of this row, as text.
    fn kv_value(&self) -> &str;
}

/// How one struct field is populated from a source column.
///
/// Column resolution tries, in order: the explicit column name from
/// [`column`](FieldBinding::column), the serialization alias from
/// [`alias`](FieldBinding::alias), the lower-cased field name, then a
/// case-insensitive pass over the same candidates.
pub struct FieldBinding<T> {
    name: &'static str,
    lowered: String,
    column: Option<&'static str>,
    alias: Option<&'static str>,
    setter: FieldSetter<T>,
}

/// Typed setter functions; one variant per convertible field type.
enum FieldSetter<T> {
    Str(fn(&mut T, String)),
    I64(fn(&mut T, i64)),
    I32(fn(&mut T, i32)),
    U64(fn(&mut T, u64)),
    U32(fn(&mut T, u32)),
    F64(fn(&mut T, f64)),
    F32(fn(&mut T, f32)),
    Bool(fn(&mut T, bool)),
}

impl<T> FieldBinding<T> {
    fn new(name: &'static str, setter: FieldSetter<T>) -> Self {
        Self {
            name,
            lowered: name.to_ascii_lowercase(),
            column: None,
            alias: None,
            setter,
        }
    }

    /// Binds a string field.
    pub fn str(name: &'static str, set: fn(&mut T, String)) -> Self {
        Self::new(name, FieldSetter::Str(set))
    }

    /// Binds an `i64` field.
    pub fn i64(name: &'static str, set: fn(&mut T, i64)) -> Self {
        Self::new(name, FieldSetter::I64(set))
    }

    /// Binds an `i32` field.
    pub fn i32(name: &'static str, set: fn(&mut T, i32)) -> Self {
        Self::new(name, FieldSetter::I32(set))
    }

    /// Binds a `u64` field.
    pub fn u64(name: &'static str, set: fn(&mut T, u64)) -> Self {
        Self::new(name, FieldSetter::U64(set))
    }

    /// Binds a `u32` field.
    pub fn u32(name: &'static str, set: fn(&mut T, u32)) -> Self {
        Self::new(name, FieldSetter::U32(set))
    }

    /// Binds an `f64` field.
    pub fn f64(name: &'static str, set: fn(&mut T, f64)) -> Self {
        Self::new(name, FieldSetter::F64(set))
    }

    /// Binds an `f32` field.
    pub fn f32(name: &'static str, set: fn(&mut T, f32)) -> Self {
        Self::new(name, FieldSetter::F32(set))
    }

    /// Binds a `bool` field.
    pub fn bool(name: &'static str, set: fn(&mut T, bool)) -> Self {
        Self::new(name, FieldSetter::Bool(set))
    }

    /// Sets an explicit source column name; takes precedence over every
    /// other candidate.
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Sets a serialization alias, tried after the explicit column.
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// The bound field name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Finds this field's cell in a record, per the documented precedence.
    pub(crate) fn resolve<'a>(&self, record: &'a RawRecord) -> Option<&'a CellValue> {
        let exact = [self.column, self.alias, Some(self.lowered.as_str())];
        for key in exact.into_iter().flatten() {
            if let Some(cell) = record.get(key) {
                return Some(cell);
            }
        }
        let relaxed = [self.column, self.alias, Some(self.name)];
        for key in relaxed.into_iter().flatten() {
            if let Some(cell) = record.get_ci(key) {
                return Some(cell);
            }
        }
        None
    }

    /// Coerces the cell and writes it into the target field.
    pub(crate) fn apply(&self, target: &mut T, cell: &CellValue) -> Result<(), CoerceError> {
        match &self.setter {
            FieldSetter::Str(set) => set(target, cell.to_string()),
            FieldSetter::I64(set) => set(target, cell.coerce_i64()?),
            FieldSetter::I32(set) => set(target, narrow(cell, "i32", i32::try_from)?),
            FieldSetter::U64(set) => set(target, narrow(cell, "u64", u64::try_from)?),
            FieldSetter::U32(set) => set(target, narrow(cell, "u32", u32::try_from)?),
            FieldSetter::F64(set) => set(target, cell.coerce_f64()?),
            FieldSetter::F32(set) => set(target, cell.coerce_f64()? as f32),
            FieldSetter::Bool(set) => set(target, cell.coerce_bool()?),
        }
        Ok(())
    }
}

/// Integer coercion followed by a checked narrowing cast.
fn narrow<N, E>(
    cell: &CellValue,
    wanted: &'static str,
    convert: fn(i64) -> Result<N, E>,
) -> Result<N, CoerceError> {
    let wide = cell.coerce_i64()?;
    convert(wide).map_err(|_| CoerceError::out_of_range(wanted, cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Serialize)]
    struct Monster {
        id: String,
        hp: i64,
        rate: f64,
        boss: bool,
        tier: u32,
    }

    impl ConfigRecord for Monster {
        fn config_name() -> &'static str {
            "Monster"
        }

        fn fields() -> Vec<FieldBinding<Self>> {
            vec![
                FieldBinding::str("id", |r, v| r.id = v),
                FieldBinding::i64("hp", |r: &mut Monster, v| r.hp = v).column("HitPoints"),
                FieldBinding::f64("rate", |r, v| r.rate = v),
                FieldBinding::bool("boss", |r: &mut Monster, v| r.boss = v).alias("isBoss"),
                FieldBinding::u32("tier", |r, v| r.tier = v),
            ]
        }
    }

    fn apply_all(record: &RawRecord) -> Monster {
        let mut target = Monster::default();
        for binding in Monster::fields() {
            if let Some(cell) = binding.resolve(record) {
                let _ = binding.apply(&mut target, cell);
            }
        }
        target
    }

    #[test]
    fn explicit_column_beats_field_name() {
        let mut rec = RawRecord::new();
        rec.insert("HitPoints", "40");
        rec.insert("hp", "99");
        assert_eq!(apply_all(&rec).hp, 40);
    }

    #[test]
    fn alias_is_tried_before_case_insensitive_pass() {
        let mut rec = RawRecord::new();
        rec.insert("isBoss", "yes");
        assert!(apply_all(&rec).boss);
    }

    #[test]
    fn case_insensitive_fallback_finds_odd_casing() {
        let mut rec = RawRecord::new();
        rec.insert("Rate", "0.25");
        assert_eq!(apply_all(&rec).rate, 0.25);
    }

    #[test]
    fn narrowing_out_of_range_fails_cleanly() {
        let binding = FieldBinding::u32("tier", |r: &mut Monster, v| r.tier = v);
        let mut target = Monster::default();
        let err = binding
            .apply(&mut target, &CellValue::Int(-5))
            .unwrap_err();
        assert!(err.to_string().contains("u32"));
        assert_eq!(target.tier, 0);
    }

    #[test]
    fn absent_columns_keep_defaults() {
        let rec = RawRecord::new();
        let monster = apply_all(&rec);
        assert_eq!(monster.hp, 0);
        assert_eq!(monster.id, "");
    }
}
