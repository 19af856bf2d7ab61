//! Export ingest: raw tables in, canonical records out.
//!
//! `source` reads files into a `RawTable`; `normalize` maps headers and
//! coerces rows into `Record`s. Nothing here knows about direction or sales.

pub mod normalize;
pub mod source;
pub mod timestamp;

pub use normalize::{normalize, validate, NormalizedBatch};
pub use source::read_table;

/// Header row plus data rows exactly as read from the export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    /// Build a table from column → value mappings. Headers are the union of
    /// keys in first-seen order; absent cells become empty strings.
    pub fn from_records<I, R, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut keyed_rows: Vec<Vec<(usize, String)>> = Vec::new();

        for record in records {
            let mut cells = Vec::new();
            for (key, value) in record {
                let key: String = key.into();
                let idx = match headers.iter().position(|h| *h == key) {
                    Some(idx) => idx,
                    None => {
                        headers.push(key);
                        headers.len() - 1
                    }
                };
                cells.push((idx, value.into()));
            }
            keyed_rows.push(cells);
        }

        let width = headers.len();
        let rows = keyed_rows
            .into_iter()
            .map(|cells| {
                let mut row = vec![String::new(); width];
                for (idx, value) in cells {
                    row[idx] = value;
                }
                row
            })
            .collect();

        RawTable { headers, rows }
    }

    /// Cell at `(row, col)`, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
