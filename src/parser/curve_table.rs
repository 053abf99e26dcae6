use crate::config::ParserConfig;
use crate::error::{DrtPrepError, Result};
use std::path::Path;
use std::str;

/// Rectangular numeric table extracted from an instrument file.
///
/// Every row has exactly `columns.len()` cells; extraction fails wholesale
/// rather than producing a partial table.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl CurveTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Locates the tagged data block in a raw instrument file and coerces it into
/// a [`CurveTable`]. Pure function of the input bytes.
pub struct TableExtractor {
    marker: String,
    header_offset: usize,
    comment_prefix: String,
}

impl TableExtractor {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            marker: config.marker.clone(),
            header_offset: config.header_offset,
            comment_prefix: config.comment_prefix.clone(),
        }
    }

    /// Extract the marker-delimited table.
    ///
    /// The header row sits `header_offset` lines below the marker line; data
    /// rows follow until the first blank or comment-prefixed line. Rows with
    /// any comment-prefixed field are dropped before numeric coercion.
    pub fn extract(&self, path: &Path, content: &[u8]) -> Result<CurveTable> {
        let text = decode_instrument_text(content);
        let lines: Vec<&str> = text.lines().collect();

        let marker_index = lines
            .iter()
            .position(|line| line.contains(&self.marker))
            .ok_or_else(|| DrtPrepError::MissingTable {
                path: path.to_path_buf(),
                marker: self.marker.clone(),
            })?;

        let header_index = marker_index + self.header_offset;
        let header_line = lines
            .get(header_index)
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && !line.starts_with(&self.comment_prefix))
            .ok_or_else(|| self.parse_error(path, "data block is empty"))?;

        let columns: Vec<String> = header_line
            .split('\t')
            .map(|field| field.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (offset, raw_line) in lines[header_index + 1..].iter().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(&self.comment_prefix) {
                break;
            }

            let fields: Vec<&str> = line.split('\t').map(|field| field.trim()).collect();
            if fields
                .iter()
                .any(|field| field.starts_with(&self.comment_prefix))
            {
                continue;
            }

            if fields.len() != columns.len() {
                return Err(self.parse_error(
                    path,
                    &format!(
                        "row {} has {} fields, header has {}",
                        offset + 1,
                        fields.len(),
                        columns.len()
                    ),
                ));
            }

            let mut row = Vec::with_capacity(fields.len());
            for field in fields {
                let value: f64 = field.parse().map_err(|_| {
                    self.parse_error(
                        path,
                        &format!("non-numeric cell {:?} in row {}", field, offset + 1),
                    )
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        Ok(CurveTable { columns, rows })
    }

    fn parse_error(&self, path: &Path, message: &str) -> DrtPrepError {
        DrtPrepError::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// Decode instrument file bytes: UTF-8 when valid, otherwise a byte-to-char
/// fallback covering the single-byte Western codepage the instrument writes.
fn decode_instrument_text(content: &[u8]) -> String {
    match str::from_utf8(content) {
        Ok(s) => s.to_string(),
        Err(_) => content.iter().map(|&b| b as char).collect(),
    }
}
