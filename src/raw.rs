//! Source tables as read from disk, before any mapping is applied.

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use log::debug;

use crate::{error::LoadError, io_utils};

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(path: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            path: path.into(),
            headers,
            rows,
        }
    }

    /// Provenance tag for rows of this table: the file stem of its path.
    pub fn source_tag(&self) -> String {
        source_tag(&self.path)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact header match first, then a case-insensitive one.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .or_else(|| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
    }
}

pub fn source_tag(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn read_raw_table(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<RawTable, LoadError> {
    let mut reader = io_utils::open_source_reader(path, delimiter)?;
    let header_record = reader
        .byte_headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    if header_record.is_empty() {
        return Err(LoadError::EmptySource {
            path: path.to_path_buf(),
        });
    }
    let mut headers =
        io_utils::decode_record(&header_record, encoding).ok_or_else(|| LoadError::Decode {
            path: path.to_path_buf(),
            row: 1,
            encoding: encoding.name(),
        })?;
    for header in &mut headers {
        *header = header.trim_start_matches('\u{feff}').trim().to_string();
    }

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded =
            io_utils::decode_record(&record, encoding).ok_or_else(|| LoadError::Decode {
                path: path.to_path_buf(),
                row: row_idx + 2,
                encoding: encoding.name(),
            })?;
        rows.push(decoded);
    }
    debug!(
        "Read {} row(s) x {} column(s) from {:?}",
        rows.len(),
        headers.len(),
        path
    );
    Ok(RawTable::new(path, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_falls_back_to_case_insensitive_match() {
        let table = RawTable::new(
            "x.csv",
            vec!["JobRole".into(), "Age".into()],
            vec![vec!["Nurse".into(), "31".into()]],
        );
        assert_eq!(table.column_index("JobRole"), Some(0));
        assert_eq!(table.column_index("age"), Some(1));
        assert_eq!(table.column_index("Region"), None);
        assert_eq!(table.cell(0, 1), Some("31"));
        assert_eq!(table.cell(3, 1), None);
    }

    #[test]
    fn source_tag_strips_directory_and_extension() {
        assert_eq!(source_tag(Path::new("data/dataset_burnout.csv")), "dataset_burnout");
    }
}
