//! Survey Export Loader Module
//! Reads a delimited questionnaire export into a raw, untrimmed cell grid.

use csv::{ReaderBuilder, Trim};
use log::debug;
use std::fs;
use std::path::Path;
use thiserror::Error;

const UTF8_BOM: &str = "\u{feff}";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed survey export: {0}")]
    Format(String),
}

/// Unprocessed rows x columns of text cells.
///
/// Rows may be ragged; a cell that is absent from a short row reads as `None`
/// from [`RawGrid::cell`] and as an empty string after [`RawGrid::transpose`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a grid from string literals.
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Trimmed column-0 labels, one per row (empty string for empty rows).
    pub fn row_labels(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.first().map(|s| s.trim()).unwrap_or(""))
            .collect()
    }

    /// Swap rows and columns, padding absent cells with empty strings.
    pub fn transpose(&self) -> RawGrid {
        let width = self.width();
        let rows = (0..width)
            .map(|col| {
                self.rows
                    .iter()
                    .map(|row| row.get(col).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        RawGrid { rows }
    }
}

/// Loads survey exports with the `csv` reader in flexible, untrimmed mode.
pub struct SurveyLoader {
    delimiter: u8,
}

impl Default for SurveyLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SurveyLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a survey export from disk.
    pub fn load_path(&self, path: &Path) -> Result<RawGrid, LoaderError> {
        let bytes = fs::read(path).map_err(|source| LoaderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|e| {
            LoaderError::Format(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;

        let grid = self.load_str(&text)?;
        debug!(
            "Loaded {}: {} rows, widest row {} cells",
            path.display(),
            grid.height(),
            grid.width()
        );
        Ok(grid)
    }

    /// Parse export content that is already in memory.
    pub fn load_str(&self, content: &str) -> Result<RawGrid, LoaderError> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::None)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let grid = RawGrid::new(rows);
        Self::check_label_column(&grid)?;
        Ok(grid)
    }

    fn check_label_column(grid: &RawGrid) -> Result<(), LoaderError> {
        if grid.is_empty() {
            return Err(LoaderError::Format("export contains no rows".to_string()));
        }
        if grid.row_labels().iter().all(|label| label.is_empty()) {
            return Err(LoaderError::Format(
                "no leading label column: every row starts with a blank cell".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn keeps_ragged_rows_and_raw_text() {
        let grid = SurveyLoader::new()
            .load_str("Question,R1,R2,R3\nQ_Age, 34 ,29\nQ_Job,student,,\n")
            .unwrap();

        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.row(1).unwrap().len(), 3);
        assert_eq!(grid.cell(1, 1), Some(" 34 "));
        assert_eq!(grid.cell(1, 3), None);
        assert_eq!(grid.cell(2, 2), Some(""));
    }

    #[test]
    fn strips_byte_order_mark() {
        let grid = SurveyLoader::new().load_str("\u{feff}Q_Age,1\n").unwrap();
        assert_eq!(grid.cell(0, 0), Some("Q_Age"));
    }

    #[test]
    fn honours_custom_delimiter() {
        let grid = SurveyLoader::new()
            .with_delimiter(b';')
            .load_str("Q_Age;34;29\n")
            .unwrap();
        assert_eq!(grid.row(0).unwrap(), &["Q_Age", "34", "29"]);
    }

    #[test]
    fn empty_input_is_format_error() {
        let err = SurveyLoader::new().load_str("").unwrap_err();
        assert!(matches!(err, LoaderError::Format(_)));
    }

    #[test]
    fn missing_label_column_is_format_error() {
        let err = SurveyLoader::new().load_str(",1,2\n ,3,4\n").unwrap_err();
        assert!(matches!(err, LoaderError::Format(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SurveyLoader::new()
            .load_path(&dir.path().join("absent.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[test]
    fn non_utf8_file_is_format_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'Q', b',', 0xff, 0xfe, b'\n']).unwrap();
        let err = SurveyLoader::new().load_path(file.path()).unwrap_err();
        assert!(matches!(err, LoaderError::Format(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Question,R1,R2").unwrap();
        writeln!(file, "Q_Age,34,").unwrap();
        let grid = SurveyLoader::new().load_path(file.path()).unwrap();
        assert_eq!(grid.row_labels(), vec!["Question", "Q_Age"]);
    }

    #[test]
    fn transpose_pads_short_rows() {
        let grid = RawGrid::from_rows(vec![vec!["Q", "R1", "R2"], vec!["Q_Age", "34"]]);
        let t = grid.transpose();
        assert_eq!(t.height(), 3);
        assert_eq!(t.row(0).unwrap(), &["Q", "Q_Age"]);
        assert_eq!(t.row(2).unwrap(), &["R2", ""]);
    }
}
