//! JSON reader: an array of flat objects, one record per element.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::{FormatReader, ReadError};
use crate::record::{CellValue, RawRecord};

/// Reads `[{...}, {...}]` files. Scalar members become cells; nested
/// arrays and objects are kept as their raw JSON text so typed fields can
/// parse them on their own terms.
pub struct JsonReader;

impl FormatReader for JsonReader {
    fn read(&self, _name: &str, path: &Path) -> Result<Vec<RawRecord>, ReadError> {
        let text = fs::read_to_string(path).map_err(|err| ReadError::io(path, err))?;
        let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&text)
            .map_err(|err| ReadError::parse(path, err.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = RawRecord::new();
            for (key, value) in row {
                record.insert(key, cell_from_json(value));
            }
            records.push(record);
        }
        Ok(records)
    }
}

fn cell_from_json(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(flag) => CellValue::Bool(flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => CellValue::Int(int),
            None => CellValue::Float(number.as_f64().unwrap_or(0.0)),
        },
        Value::String(text) => CellValue::Str(text),
        nested @ (Value::Array(_) | Value::Object(_)) => CellValue::Str(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read_str(json: &str) -> Result<Vec<RawRecord>, ReadError> {
        let mut file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();
        JsonReader.read("test", file.path())
    }

    #[test]
    fn reads_array_of_objects() {
        let records =
            read_str(r#"[{"id":"1","name":"Sword","price":120},{"id":"2","name":"Shield"}]"#)
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&CellValue::from("Sword")));
        assert_eq!(records[0].get("price"), Some(&CellValue::Int(120)));
    }

    #[test]
    fn nested_structures_stay_as_json_text() {
        let records = read_str(r#"[{"id":"1","tags":["a","b"],"meta":{"k":1}}]"#).unwrap();
        assert_eq!(
            records[0].get("tags"),
            Some(&CellValue::from(r#"["a","b"]"#))
        );
        assert_eq!(records[0].get("meta"), Some(&CellValue::from(r#"{"k":1}"#)));
    }

    #[test]
    fn non_array_root_is_a_parse_error() {
        let err = read_str(r#"{"id":"1"}"#).unwrap_err();
        assert!(matches!(err, ReadError::Parse { .. }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = read_str("[{not json").unwrap_err();
        assert!(matches!(err, ReadError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = JsonReader
            .read("test", Path::new("/definitely/not/here.json"))
            .unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
    }
}
