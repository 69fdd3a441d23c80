//! Raw records: one source row as an ordered column map.

use indexmap::IndexMap;
use serde::Serialize;

use super::value::CellValue;

/// Column keys probed, in order, when resolving a record identifier.
const ID_KEYS: [&str; 3] = ["id", "ID", "Id"];

/// One source row, before (or instead of) typed conversion.
///
/// Columns keep their source order, so exported JSON and list iteration
/// mirror the file.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct RawRecord {
    columns: IndexMap<String, CellValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column; an existing column with the same name is replaced
    /// in place, keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CellValue>) {
        self.columns.insert(name.into(), value.into());
    }

    /// Exact-name column lookup.
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.columns.get(name)
    }

    /// Case-insensitive column lookup; first match in column order wins.
    pub fn get_ci(&self, name: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates columns in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Resolves the record identifier.
    ///
    /// Probes `id`, `ID`, `Id`, then the format-specific fallback key, and
    /// returns the first present non-empty value rendered as a string.
    /// `None` means the record is reachable through list iteration only.
    pub fn id(&self, fallback: Option<&str>) -> Option<String> {
        ID_KEYS
            .iter()
            .copied()
            .chain(fallback)
            .filter_map(|key| self.columns.get(key))
            .map(CellValue::to_string)
            .find(|rendered| !rendered.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        let mut rec = RawRecord::new();
        for (key, value) in pairs {
            rec.insert(*key, *value);
        }
        rec
    }

    #[test]
    fn id_lowercase_wins_over_uppercase() {
        let rec = record(&[("ID", "9"), ("id", "7")]);
        assert_eq!(rec.id(None).as_deref(), Some("7"));
    }

    #[test]
    fn id_falls_through_empty_values() {
        let rec = record(&[("id", ""), ("ID", "9")]);
        assert_eq!(rec.id(None).as_deref(), Some("9"));
    }

    #[test]
    fn id_uses_format_fallback_last() {
        let rec = record(&[("itemId", "31"), ("name", "Sword")]);
        assert_eq!(rec.id(Some("itemId")).as_deref(), Some("31"));
        assert_eq!(rec.id(None), None);
    }

    #[test]
    fn id_renders_numeric_cells() {
        let mut rec = RawRecord::new();
        rec.insert("id", 12_i64);
        assert_eq!(rec.id(None).as_deref(), Some("12"));
    }

    #[test]
    fn columns_keep_source_order() {
        let rec = record(&[("zeta", "1"), ("alpha", "2"), ("mid", "3")]);
        let keys: Vec<&str> = rec.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn case_insensitive_lookup() {
        let rec = record(&[("AttackPower", "5")]);
        assert!(rec.get("attackpower").is_none());
        assert_eq!(
            rec.get_ci("attackpower"),
            Some(&CellValue::from("5"))
        );
    }
}
