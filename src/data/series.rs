//! Numeric series and pairwise alignment.

use crate::config::FieldName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attempt to read raw cell text as a finite decimal number.
///
/// Blank, non-numeric, and non-finite text (`inf`, `NaN`) are absent.
pub fn coerce(cell: &str) -> Option<f64> {
    let text = cell.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Valid numeric responses to one question.
///
/// `respondents[i]` is the position `values[i]` came from: the source column
/// for row extraction, the respondent index for table extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub field: FieldName,
    values: Vec<f64>,
    respondents: Vec<usize>,
}

impl Series {
    pub fn new(field: FieldName, values: Vec<f64>, respondents: Vec<usize>) -> Self {
        debug_assert_eq!(values.len(), respondents.len());
        Self {
            field,
            values,
            respondents,
        }
    }

    /// Series whose respondent positions are simply 0..n.
    pub fn from_values(field: FieldName, values: Vec<f64>) -> Self {
        let respondents = (0..values.len()).collect();
        Self::new(field, values, respondents)
    }

    pub fn empty(field: FieldName) -> Self {
        Self::new(field, Vec::new(), Vec::new())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn respondents(&self) -> &[usize] {
        &self.respondents
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// How two series are paired up for a two-variable comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    /// First `min(len)` values of each, by array position.
    #[default]
    Positional,
    /// Only respondents present in both series, in the first series' order.
    ByRespondent,
}

/// Two equally long series for pairwise comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub x: Series,
    pub y: Series,
}

impl AlignedPair {
    pub fn align(a: &Series, b: &Series, strategy: AlignmentStrategy) -> Self {
        match strategy {
            AlignmentStrategy::Positional => Self::positional(a, b),
            AlignmentStrategy::ByRespondent => Self::by_respondent(a, b),
        }
    }

    /// Truncate both series to the shorter length.
    ///
    /// Respondent identity is ignored: if coercion dropped different
    /// respondents from each series, pair `i` may compare two different people.
    pub fn positional(a: &Series, b: &Series) -> Self {
        let n = a.len().min(b.len());
        Self {
            x: Self::take(a, n),
            y: Self::take(b, n),
        }
    }

    /// Join on respondent position, keeping only respondents valid in both.
    pub fn by_respondent(a: &Series, b: &Series) -> Self {
        let b_index: HashMap<usize, f64> = b
            .respondents
            .iter()
            .copied()
            .zip(b.values.iter().copied())
            .collect();

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut ids = Vec::new();
        for (&id, &x) in a.respondents.iter().zip(&a.values) {
            if let Some(&y) = b_index.get(&id) {
                xs.push(x);
                ys.push(y);
                ids.push(id);
            }
        }

        Self {
            x: Series::new(a.field.clone(), xs, ids.clone()),
            y: Series::new(b.field.clone(), ys, ids),
        }
    }

    fn take(series: &Series, n: usize) -> Series {
        Series::new(
            series.field.clone(),
            series.values[..n].to_vec(),
            series.respondents[..n].to_vec(),
        )
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn swapped(&self) -> Self {
        Self {
            x: self.y.clone(),
            y: self.x.clone(),
        }
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x
            .values()
            .iter()
            .copied()
            .zip(self.y.values().iter().copied())
    }
}
