//! Survey Normalizer Module
//! Turns a raw question-per-row grid into series and respondent tables.

use crate::config::{FieldMapping, FieldName};
use crate::data::loader::RawGrid;
use crate::data::series::{coerce, Series};
use log::{debug, warn};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Name of the respondent index column in a [`RespondentTable`].
pub const RESPONDENT_COLUMN: &str = "respondent";

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Grid has no header row")]
    MissingHeaderRow,
    #[error("Field {0} appears more than once in the header row")]
    DuplicateField(FieldName),
}

/// Respondent-indexed table with one nullable column per field.
///
/// Numeric fields are `Float64`, the rest `String`. The leading
/// [`RESPONDENT_COLUMN`] holds each respondent's position before empty rows
/// were dropped.
#[derive(Debug, Clone)]
pub struct RespondentTable {
    df: DataFrame,
    fields: Vec<FieldName>,
}

impl RespondentTable {
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn fields(&self) -> &[FieldName] {
        &self.fields
    }

    pub fn has_field(&self, field: &FieldName) -> bool {
        self.fields.contains(field)
    }

    pub fn respondent_count(&self) -> usize {
        self.df.height()
    }

    /// (respondents, fields) excluding the index column.
    pub fn shape(&self) -> (usize, usize) {
        (self.df.height(), self.fields.len())
    }

    pub fn respondents(&self) -> Result<Vec<usize>, NormalizerError> {
        Ok(self
            .df
            .column(RESPONDENT_COLUMN)?
            .u32()?
            .into_iter()
            .flatten()
            .map(|id| id as usize)
            .collect())
    }

    /// Per-respondent value of a numeric field, `None` where missing.
    pub fn column_values(&self, field: &FieldName) -> Option<Vec<Option<f64>>> {
        let column = self.df.column(field.as_str()).ok()?;
        let values = column.f64().ok()?;
        Some(values.into_iter().collect())
    }

    /// Per-respondent text of a field, `None` where missing.
    pub fn text_values(&self, field: &FieldName) -> Option<Vec<Option<String>>> {
        let column = self.df.column(field.as_str()).ok()?;
        let values = column.str().ok()?;
        Some(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Non-missing values of a numeric field.
    ///
    /// `None` if the field is absent or not numeric; an empty series if every
    /// respondent is missing it.
    pub fn series(&self, field: &FieldName) -> Option<Series> {
        let values = self.column_values(field)?;
        let ids = self.respondents().ok()?;

        let (respondents, values): (Vec<usize>, Vec<f64>) = ids
            .into_iter()
            .zip(values)
            .filter_map(|(id, v)| v.map(|v| (id, v)))
            .unzip();
        Some(Series::new(field.clone(), values, respondents))
    }

    /// Rows where every listed field is present.
    pub fn complete_cases(
        &self,
        fields: &[FieldName],
    ) -> Result<RespondentTable, NormalizerError> {
        let mut keep = lit(true);
        for field in fields {
            keep = keep.and(col(field.as_str()).is_not_null());
        }
        let df = self.df.clone().lazy().filter(keep).collect()?;
        Ok(RespondentTable {
            df,
            fields: self.fields.clone(),
        })
    }
}

/// Reshapes raw grids according to a [`FieldMapping`].
pub struct SurveyNormalizer {
    mapping: FieldMapping,
}

impl SurveyNormalizer {
    pub fn new(mapping: FieldMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// One row as numbers, skipping the leading label cells.
    ///
    /// Blank cells and cells that fail coercion are dropped. An out-of-range
    /// row gives an empty series. Respondent positions count from the first
    /// cell after the skipped ones, so with one label column they match the
    /// [`RESPONDENT_COLUMN`] of the reoriented table.
    pub fn extract_row_series(
        grid: &RawGrid,
        row_index: usize,
        skip_leading_columns: usize,
    ) -> Series {
        let Some(row) = grid.row(row_index) else {
            return Series::empty(FieldName::new(format!("row{}", row_index)));
        };
        let field = FieldName::new(row.first().map(|s| s.trim()).unwrap_or_default());

        let (respondents, values): (Vec<usize>, Vec<f64>) = row
            .iter()
            .enumerate()
            .skip(skip_leading_columns)
            .filter(|(_, cell)| !cell.trim().is_empty())
            .filter_map(|(idx, cell)| coerce(cell).map(|v| (idx - skip_leading_columns, v)))
            .unzip();

        Series::new(field, values, respondents)
    }

    /// Row index of a field in the question-per-row layout.
    pub fn find_row(&self, grid: &RawGrid, field: &FieldName) -> Option<usize> {
        grid.row_labels()
            .iter()
            .position(|label| !label.is_empty() && &self.mapping.field_for_label(label) == field)
    }

    /// Numeric answers for a field, found by its label in column 0.
    ///
    /// `None` when no row maps to the field.
    pub fn series_for_field(&self, grid: &RawGrid, field: &FieldName) -> Option<Series> {
        let Some(row_index) = self.find_row(grid, field) else {
            warn!("Field {} not found in survey export", field);
            return None;
        };
        let mut series = Self::extract_row_series(grid, row_index, 1);
        series.field = field.clone();
        debug!("{}: {} numeric responses (row {})", field, series.len(), row_index);
        Some(series)
    }

    /// Non-blank trimmed answers for a categorical field.
    pub fn labels_for_field(&self, grid: &RawGrid, field: &FieldName) -> Option<Vec<String>> {
        let row_index = self.find_row(grid, field)?;
        let row = grid.row(row_index)?;
        Some(
            row.iter()
                .skip(1)
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Pivot a respondent-per-row grid whose row 0 holds field headers.
    ///
    /// The first `label_columns` cells of every row are discarded, as are
    /// columns whose header is blank. Rows with no value in any field are
    /// dropped.
    pub fn reorient(
        &self,
        grid: &RawGrid,
        label_columns: usize,
    ) -> Result<RespondentTable, NormalizerError> {
        let header = grid.row(0).ok_or(NormalizerError::MissingHeaderRow)?;
        let (sources, fields): (Vec<usize>, Vec<FieldName>) = header
            .iter()
            .enumerate()
            .skip(label_columns)
            .filter(|(idx, label)| {
                let blank = label.trim().is_empty();
                if blank {
                    debug!("Skipping column {} with a blank header", idx);
                }
                !blank
            })
            .map(|(idx, label)| (idx, self.mapping.field_for_label(label)))
            .unzip();

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field) {
                return Err(NormalizerError::DuplicateField(field.clone()));
            }
        }
        for (&idx, field) in sources.iter().zip(&fields) {
            if !self.mapping.is_mapped(&header[idx]) {
                debug!("Unmapped header {:?} kept as text field {}", header[idx].trim(), field);
            }
        }

        let mut respondents: Vec<u32> = Vec::new();
        let mut numeric: Vec<Vec<Option<f64>>> = vec![Vec::new(); fields.len()];
        let mut text: Vec<Vec<Option<String>>> = vec![Vec::new(); fields.len()];
        let mut dropped = 0usize;

        for (position, row) in grid.rows().iter().skip(1).enumerate() {
            let cells: Vec<&str> = sources
                .iter()
                .map(|&idx| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect();

            let parsed: Vec<(Option<f64>, Option<String>)> = fields
                .iter()
                .zip(&cells)
                .map(|(field, cell)| {
                    if self.mapping.is_numeric(field) {
                        (coerce(cell), None)
                    } else {
                        let trimmed = cell.trim();
                        (None, (!trimmed.is_empty()).then(|| trimmed.to_string()))
                    }
                })
                .collect();

            if parsed.iter().all(|(n, t)| n.is_none() && t.is_none()) {
                dropped += 1;
                continue;
            }

            respondents.push(position as u32);
            for (i, (n, t)) in parsed.into_iter().enumerate() {
                numeric[i].push(n);
                text[i].push(t);
            }
        }

        let mut columns = vec![Column::new(RESPONDENT_COLUMN.into(), respondents)];
        for ((field, n), t) in fields.iter().zip(numeric).zip(text) {
            let column = if self.mapping.is_numeric(field) {
                Column::new(field.as_str().into(), n)
            } else {
                Column::new(field.as_str().into(), t)
            };
            columns.push(column);
        }
        let df = DataFrame::new(columns)?;

        debug!(
            "Reoriented survey: {} respondents, {} fields, {} empty rows dropped",
            df.height(),
            fields.len(),
            dropped
        );
        Ok(RespondentTable { df, fields })
    }

    /// Reorient the physical question-per-row layout.
    ///
    /// The grid is transposed so column 0 (question labels) becomes the
    /// header row, and the respondent-label column is discarded.
    pub fn reorient_questionnaire(
        &self,
        grid: &RawGrid,
    ) -> Result<RespondentTable, NormalizerError> {
        let transposed = grid.transpose();
        let labeled = RawGrid::new(
            transposed
                .rows()
                .iter()
                .map(|row| row.iter().skip(1).cloned().collect())
                .collect(),
        );
        self.reorient(&labeled, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldSpec, SurveyConfig};
    use crate::data::series::{AlignedPair, AlignmentStrategy};

    fn mapping() -> FieldMapping {
        let spec = |label: &str, field: &str, numeric: bool| FieldSpec {
            label: label.to_string(),
            field: FieldName::new(field),
            display: None,
            numeric,
        };
        FieldMapping::new(&[
            spec("Q_Age", "Age", true),
            spec("Q_Job", "Occupation", false),
            spec("Q_Soccer", "SoccerInterest", true),
            spec("Q_Tech", "TechAffinity", true),
        ])
    }

    fn questionnaire() -> RawGrid {
        RawGrid::from_rows(vec![
            vec!["Question", "R1", "R2", "R3", "R4"],
            vec!["Q_Age", "34", "29", "", "51"],
            vec!["Q_Job", "engineer", " ", "nurse"],
            vec!["Q_Soccer", "5", "3", "4"],
            vec!["Q_Tech", "2", "", "1", "5"],
        ])
    }

    #[test]
    fn extract_row_drops_blank_cells() {
        let grid = RawGrid::from_rows(vec![vec!["Q_Age", "34", "29", "", "51"]]);
        let series = SurveyNormalizer::extract_row_series(&grid, 0, 1);
        assert_eq!(series.values(), &[34.0, 29.0, 51.0]);
        assert_eq!(series.respondents(), &[0, 1, 3]);
        assert_eq!(series.field.as_str(), "Q_Age");
    }

    #[test]
    fn extract_row_drops_non_numeric_cells() {
        let grid = RawGrid::from_rows(vec![vec!["Q", "4", "n/a", " 3 ", "five", "2.5"]]);
        let series = SurveyNormalizer::extract_row_series(&grid, 0, 1);
        assert_eq!(series.values(), &[4.0, 3.0, 2.5]);
    }

    #[test]
    fn extract_row_never_exceeds_populated_cells() {
        let grid = RawGrid::from_rows(vec![vec!["7", "1", "", "2"]]);
        for skip in 0..5 {
            let series = SurveyNormalizer::extract_row_series(&grid, 0, skip);
            let populated = grid.row(0).unwrap().iter().filter(|c| !c.is_empty()).count();
            assert!(series.len() <= populated.saturating_sub(skip));
        }
    }

    #[test]
    fn extract_missing_row_is_empty() {
        let grid = RawGrid::from_rows(vec![vec!["Q_Age", "34"]]);
        assert!(SurveyNormalizer::extract_row_series(&grid, 9, 1).is_empty());
    }

    #[test]
    fn positional_alignment_reproduces_misalignment() {
        let grid = questionnaire();
        let normalizer = SurveyNormalizer::new(mapping());
        let soccer = normalizer
            .series_for_field(&grid, &FieldName::new("SoccerInterest"))
            .unwrap();
        let tech = normalizer
            .series_for_field(&grid, &FieldName::new("TechAffinity"))
            .unwrap();
        assert_eq!(soccer.len(), 3);
        assert_eq!(tech.len(), 3);

        let pair = AlignedPair::align(&soccer, &tech, AlignmentStrategy::Positional);
        assert_eq!(pair.len(), 3);
        // third soccer answer paired with the fourth respondent's tech answer
        assert_eq!(pair.points().nth(2), Some((4.0, 5.0)));
        assert_eq!(pair.x.respondents()[2], 2);
        assert_eq!(pair.y.respondents()[2], 3);

        let joined = AlignedPair::align(&soccer, &tech, AlignmentStrategy::ByRespondent);
        assert_eq!(joined.points().collect::<Vec<_>>(), vec![(5.0, 2.0), (4.0, 1.0)]);
    }

    #[test]
    fn absent_field_differs_from_empty_series() {
        let grid = RawGrid::from_rows(vec![vec!["Q_Age", "", "x"]]);
        let normalizer = SurveyNormalizer::new(mapping());
        let age = normalizer.series_for_field(&grid, &FieldName::new("Age"));
        assert_eq!(age.map(|s| s.len()), Some(0));
        assert!(normalizer
            .series_for_field(&grid, &FieldName::new("TechAffinity"))
            .is_none());
    }

    #[test]
    fn labels_for_categorical_field() {
        let normalizer = SurveyNormalizer::new(mapping());
        let jobs = normalizer
            .labels_for_field(&questionnaire(), &FieldName::new("Occupation"))
            .unwrap();
        assert_eq!(jobs, vec!["engineer", "nurse"]);
    }

    #[test]
    fn reorient_keeps_partial_respondents() {
        let grid = RawGrid::from_rows(vec![
            vec!["ID", "Q_Age", "Q_Soccer"],
            vec!["1", "34", "5"],
            vec!["2", "", "3"],
        ]);
        let table = SurveyNormalizer::new(mapping()).reorient(&grid, 0).unwrap();

        assert_eq!(table.respondent_count(), 2);
        assert_eq!(
            table.fields(),
            &[
                FieldName::new("ID"),
                FieldName::new("Age"),
                FieldName::new("SoccerInterest")
            ]
        );
        assert_eq!(
            table.column_values(&FieldName::new("Age")).unwrap(),
            vec![Some(34.0), None]
        );
        assert_eq!(
            table.column_values(&FieldName::new("SoccerInterest")).unwrap(),
            vec![Some(5.0), Some(3.0)]
        );
        assert_eq!(
            table.text_values(&FieldName::new("ID")).unwrap(),
            vec![Some("1".to_string()), Some("2".to_string())]
        );
    }

    #[test]
    fn reorient_drops_fully_empty_rows() {
        let grid = RawGrid::from_rows(vec![
            vec!["Q_Age", "Q_Soccer"],
            vec!["", "abc"],
            vec!["40", ""],
            vec![" "],
        ]);
        let table = SurveyNormalizer::new(mapping()).reorient(&grid, 0).unwrap();
        assert_eq!(table.respondent_count(), 1);
        assert_eq!(table.respondents().unwrap(), vec![1]);
        let age = table.series(&FieldName::new("Age")).unwrap();
        assert_eq!(age.values(), &[40.0]);
        assert_eq!(age.respondents(), &[1]);
        assert!(table.series(&FieldName::new("SoccerInterest")).unwrap().is_empty());
    }

    #[test]
    fn reorient_rejects_duplicate_fields() {
        let grid = RawGrid::from_rows(vec![vec!["Q_Age", "Q_Age"], vec!["1", "2"]]);
        let err = SurveyNormalizer::new(mapping()).reorient(&grid, 0).unwrap_err();
        assert!(matches!(err, NormalizerError::DuplicateField(_)));
    }

    #[test]
    fn reorient_empty_grid_has_no_header() {
        let err = SurveyNormalizer::new(mapping())
            .reorient(&RawGrid::default(), 0)
            .unwrap_err();
        assert!(matches!(err, NormalizerError::MissingHeaderRow));
    }

    #[test]
    fn both_modes_agree_on_same_file() {
        let grid = questionnaire();
        let normalizer = SurveyNormalizer::new(mapping());
        let table = normalizer.reorient_questionnaire(&grid).unwrap();

        assert_eq!(table.shape(), (4, 4));
        let age_rows = normalizer.series_for_field(&grid, &FieldName::new("Age")).unwrap();
        let age_table = table.series(&FieldName::new("Age")).unwrap();
        assert_eq!(age_rows.values(), age_table.values());
        assert_eq!(
            table.text_values(&FieldName::new("Occupation")).unwrap(),
            vec![
                Some("engineer".to_string()),
                None,
                Some("nurse".to_string()),
                None
            ]
        );
    }

    #[test]
    fn complete_cases_is_a_respondent_join() {
        let table = SurveyNormalizer::new(mapping())
            .reorient_questionnaire(&questionnaire())
            .unwrap();
        let fields = [FieldName::new("SoccerInterest"), FieldName::new("TechAffinity")];
        let complete = table.complete_cases(&fields).unwrap();
        assert_eq!(complete.respondents().unwrap(), vec![0, 2]);
        assert_eq!(complete.series(&fields[1]).unwrap().values(), &[2.0, 1.0]);
    }

    #[test]
    fn row_and_table_series_share_respondent_positions() {
        let grid = questionnaire();
        let normalizer = SurveyNormalizer::new(mapping());
        let table = normalizer.reorient_questionnaire(&grid).unwrap();

        let soccer_row = normalizer
            .series_for_field(&grid, &FieldName::new("SoccerInterest"))
            .unwrap();
        let tech_table = table.series(&FieldName::new("TechAffinity")).unwrap();
        assert_eq!(soccer_row.respondents(), &[0, 1, 2]);
        assert_eq!(tech_table.respondents(), &[0, 2, 3]);

        let mixed = AlignedPair::by_respondent(&soccer_row, &tech_table);
        assert_eq!(mixed.points().collect::<Vec<_>>(), vec![(5.0, 2.0), (4.0, 1.0)]);
    }

    #[test]
    fn reorient_skips_blank_spacer_rows() {
        let grid = RawGrid::from_rows(vec![
            vec!["Question", "R1", "R2", "R3"],
            vec!["Q_Age", "34", "29", "51"],
            vec!["", "", "", ""],
            vec!["Q_Soccer", "5", "3", "4"],
            vec![" ", "", "", ""],
        ]);
        let table = SurveyNormalizer::new(mapping())
            .reorient_questionnaire(&grid)
            .unwrap();
        assert_eq!(
            table.fields(),
            &[FieldName::new("Age"), FieldName::new("SoccerInterest")]
        );
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(
            table.series(&FieldName::new("SoccerInterest")).unwrap().values(),
            &[5.0, 3.0, 4.0]
        );
    }

    #[test]
    fn reorient_is_deterministic() {
        let normalizer = SurveyNormalizer::new(SurveyConfig::default().mapping());
        let grid = questionnaire();
        let a = normalizer.reorient_questionnaire(&grid).unwrap();
        let b = normalizer.reorient_questionnaire(&grid).unwrap();
        assert!(a.dataframe().equals_missing(b.dataframe()));
    }
}
