//! TSV reader: tab-separated rows under a header line.

use std::fs;
use std::path::Path;

use super::{FormatReader, ReadError};
use crate::record::RawRecord;

/// Reads tab-separated files. The first non-empty line names the columns;
/// every later non-empty line is one record. All cells are strings. Short
/// rows just omit their trailing columns; extra cells are dropped.
pub struct TsvReader;

impl FormatReader for TsvReader {
    fn read(&self, _name: &str, path: &Path) -> Result<Vec<RawRecord>, ReadError> {
        let text = fs::read_to_string(path).map_err(|err| ReadError::io(path, err))?;

        let mut lines = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty());

        let Some(header_line) = lines.next() else {
            return Ok(Vec::new());
        };
        let headers: Vec<&str> = header_line.split('\t').map(str::trim).collect();

        let mut records = Vec::new();
        for line in lines {
            let mut record = RawRecord::new();
            for (header, cell) in headers.iter().zip(line.split('\t')) {
                if header.is_empty() {
                    continue;
                }
                record.insert(*header, cell);
            }
            if record.is_empty() {
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;
    use std::io::Write;

    fn read_str(tsv: &str) -> Vec<RawRecord> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(tsv.as_bytes()).unwrap();
        file.flush().unwrap();
        TsvReader.read("test", file.path()).unwrap()
    }

    #[test]
    fn header_names_the_columns() {
        let records = read_str("id\tname\tprice\n1\tSword\t120\n2\tShield\t80\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("id"), Some(&CellValue::from("1")));
        assert_eq!(records[1].get("name"), Some(&CellValue::from("Shield")));
    }

    #[test]
    fn short_rows_omit_trailing_columns() {
        let records = read_str("id\tname\tprice\n1\tSword\n");
        assert_eq!(records[0].get("name"), Some(&CellValue::from("Sword")));
        assert!(records[0].get("price").is_none());
    }

    #[test]
    fn extra_cells_are_dropped() {
        let records = read_str("id\tname\n1\tSword\tstray\n");
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn blank_lines_and_crlf_are_tolerated() {
        let records = read_str("id\tname\r\n\r\n1\tSword\r\n\n2\tShield\n");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn empty_file_has_no_records() {
        assert!(read_str("").is_empty());
        assert!(read_str("\n\n").is_empty());
    }
}
