//! Spreadsheet reader: fixed header convention over a decoded cell grid.
//!
//! Workbook layout, by row (1-based):
//! ```text
//! 1  comment / designer notes        (ignored)
//! 2  display names                   (ignored)
//! 3  client field names              (ignored)
//! 4  value types                     (int, long, float, double, bool, json, string)
//! 5  server field names              (authoritative column names)
//! 6+ data rows
//! ```
//! Column 1 is a marker column and carries no data. Columns with an empty
//! server field name are skipped. Cells a row does not have are omitted,
//! not zero-filled, so a row decoded as empty contributes no record.

use std::path::Path;
use std::sync::Arc;

use super::{FormatReader, ReadError};
use crate::record::{parse_lenient_bool, CellValue, RawRecord};

/// Data rows start here (0-based).
const FIRST_DATA_ROW: usize = 5;
/// Row of value-type annotations (0-based).
const TYPE_ROW: usize = 3;
/// Row of server field names (0-based).
const HEADER_ROW: usize = 4;
/// The marker column, skipped entirely.
const MARKER_COLUMN: usize = 0;

/// Decodes a workbook file into the primary sheet's cell grid, cells as
/// display strings.
///
/// Binary workbook parsing is the embedder's concern; register an
/// implementation with
/// [`ConfigEngine::register_sheet_decoder`](crate::ConfigEngine::register_sheet_decoder)
/// to enable `.xlsx`/`.xls` sources. Decoders should trim trailing empty
/// cells from each row, the way spreadsheet libraries report them.
pub trait SheetDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Vec<Vec<String>>, ReadError>;
}

/// Applies the header convention to a decoded grid.
pub struct SheetReader {
    decoder: Arc<dyn SheetDecoder>,
}

impl SheetReader {
    pub fn new(decoder: Arc<dyn SheetDecoder>) -> Self {
        Self { decoder }
    }
}

impl FormatReader for SheetReader {
    fn read(&self, _name: &str, path: &Path) -> Result<Vec<RawRecord>, ReadError> {
        let grid = self.decoder.decode(path)?;
        if grid.len() <= FIRST_DATA_ROW {
            return Ok(Vec::new());
        }

        let types = &grid[TYPE_ROW];
        let headers = &grid[HEADER_ROW];

        let mut records = Vec::with_capacity(grid.len() - FIRST_DATA_ROW);
        for row in &grid[FIRST_DATA_ROW..] {
            let mut record = RawRecord::new();
            for (column, raw) in row.iter().enumerate() {
                if column == MARKER_COLUMN {
                    continue;
                }
                if column >= headers.len() {
                    break;
                }
                let header = headers[column].trim();
                if header.is_empty() {
                    continue;
                }
                let kind = types.get(column).map(String::as_str).unwrap_or("");
                record.insert(header, typed_cell(kind, raw));
            }
            if record.is_empty() {
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }
}

/// Types a non-empty cell per the row-4 annotation. Unparseable cells fall
/// back to their string form so conversion can report them with the
/// original text. Empty cells stay empty strings; zeroing them is the
/// converter's business.
fn typed_cell(kind: &str, raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Str(raw.to_string());
    }
    match kind.trim().to_ascii_lowercase().as_str() {
        "int" | "int32" | "long" | "int64" => trimmed
            .parse::<i64>()
            .map(CellValue::Int)
            .unwrap_or_else(|_| CellValue::Str(raw.to_string())),
        "float" | "float32" | "double" | "float64" => trimmed
            .parse::<f64>()
            .map(CellValue::Float)
            .unwrap_or_else(|_| CellValue::Str(raw.to_string())),
        "bool" | "boolean" => parse_lenient_bool(trimmed)
            .map(CellValue::Bool)
            .unwrap_or_else(|| CellValue::Str(raw.to_string())),
        _ => CellValue::Str(raw.to_string()),
    }
}
