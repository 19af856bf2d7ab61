//! Reading exports from disk into a `RawTable`.
//!
//! Format is detected by file extension. CSV/TSV go through the `csv` crate;
//! spreadsheets go through calamine and use the first sheet. The file handle
//! is opened and released inside each call.

use std::io::Read;
use std::path::Path;

use crate::error::AnalysisError;

use super::RawTable;

/// Export formats we can read, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// .csv
    Csv,
    /// .tsv
    Tsv,
    /// .xlsx, .xls, .xlsm, .ods
    Workbook,
    Unsupported,
}

/// Detect the export format from a path's extension.
pub fn detect_format(path: &Path) -> ExportFormat {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => ExportFormat::Csv,
        "tsv" => ExportFormat::Tsv,
        "xlsx" | "xls" | "xlsm" | "ods" => ExportFormat::Workbook,
        _ => ExportFormat::Unsupported,
    }
}

/// Read an export file into a raw table.
pub fn read_table(path: &Path) -> Result<RawTable, AnalysisError> {
    let table = match detect_format(path) {
        ExportFormat::Csv => read_delimited(std::fs::File::open(path)?, b',')?,
        ExportFormat::Tsv => read_delimited(std::fs::File::open(path)?, b'\t')?,
        ExportFormat::Workbook => read_workbook(path)?,
        ExportFormat::Unsupported => {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();
            return Err(AnalysisError::UnsupportedFormat(ext));
        }
    };

    log::info!(
        "source: read {} rows x {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

/// Read delimited text. Rows may be ragged; short rows are padded with empty
/// cells and extra cells are kept (they map to no header and are ignored).
/// Cells that are not valid UTF-8 are decoded lossily so one bad row never
/// sinks the file.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<RawTable, AnalysisError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.byte_headers()?.iter().map(decode_cell).collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AnalysisError::EmptyInput);
    }

    let mut rows = Vec::new();
    let mut lossy_rows = 0usize;
    for result in rdr.byte_records() {
        let record = result?;
        if std::str::from_utf8(record.as_slice()).is_err() {
            lossy_rows += 1;
        }
        let mut row: Vec<String> = record.iter().map(decode_cell).collect();
        if row.len() < headers.len() {
            row.resize(headers.len(), String::new());
        }
        rows.push(row);
    }
    if lossy_rows > 0 {
        log::warn!("source: {} rows contained invalid UTF-8, replaced with U+FFFD", lossy_rows);
    }

    Ok(RawTable::new(headers, rows))
}

fn decode_cell(cell: &[u8]) -> String {
    String::from_utf8_lossy(cell).into_owned()
}

fn read_workbook(path: &Path) -> Result<RawTable, AnalysisError> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(AnalysisError::EmptyInput)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_to_string).collect(),
        None => return Err(AnalysisError::EmptyInput),
    };
    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    log::debug!("source: using sheet '{}'", sheet_name);
    Ok(RawTable::new(headers, rows))
}

fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("messages.csv")), ExportFormat::Csv);
        assert_eq!(detect_format(Path::new("messages.CSV")), ExportFormat::Csv);
        assert_eq!(detect_format(Path::new("messages.tsv")), ExportFormat::Tsv);
        assert_eq!(detect_format(Path::new("export.xlsx")), ExportFormat::Workbook);
        assert_eq!(detect_format(Path::new("export.ods")), ExportFormat::Workbook);
        assert_eq!(detect_format(Path::new("notes.md")), ExportFormat::Unsupported);
        assert_eq!(detect_format(Path::new("noext")), ExportFormat::Unsupported);
    }

    #[test]
    fn test_read_delimited_quoted_and_ragged() {
        let data = "CONVERSATION ID,FROM,TO,DATE,CONTENT\n\
                    T1,Alice,Bob,2024-01-01T10:00:00Z,\"Hi Bob, quick question\"\n\
                    T1,Bob,Alice\n";
        let table = read_delimited(data.as_bytes(), b',').unwrap();
        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][4], "Hi Bob, quick question");
        assert_eq!(table.rows[1].len(), 5);
        assert_eq!(table.rows[1][3], "");
    }

    #[test]
    fn test_read_delimited_tab() {
        let data = "FROM\tTO\nAlice\tBob\n";
        let table = read_delimited(data.as_bytes(), b'\t').unwrap();
        assert_eq!(table.headers, vec!["FROM", "TO"]);
        assert_eq!(table.rows[0], vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_read_delimited_invalid_utf8_row_is_kept_lossy() {
        let data: &[u8] = b"FROM,TO,CONTENT\nAlice,Bob,hello\nBob,Alice,bad \xff\xfe bytes\nAlice,Bob,again\n";
        let table = read_delimited(data, b',').unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec!["Alice", "Bob", "hello"]);
        assert_eq!(table.rows[1][0], "Bob");
        assert!(table.rows[1][2].starts_with("bad "));
        assert!(table.rows[1][2].contains('\u{FFFD}'));
        assert_eq!(table.rows[2][2], "again");
    }

    #[test]
    fn test_read_table_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "CONVERSATION ID,FROM,TO,DATE,CONTENT").unwrap();
        writeln!(file, "T1,Alice,Bob,2024-01-01 10:00:00 UTC,Hello").unwrap();
        drop(file);

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 1), "Alice");
    }

    #[test]
    fn test_read_table_missing_file_is_io_error() {
        let path = PathBuf::from("/definitely/not/here/messages.csv");
        assert!(matches!(read_table(&path), Err(AnalysisError::Io(_))));
    }

    #[test]
    fn test_read_table_unsupported_extension() {
        let path = PathBuf::from("messages.json");
        match read_table(&path) {
            Err(AnalysisError::UnsupportedFormat(ext)) => assert_eq!(ext, "json"),
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }
}
