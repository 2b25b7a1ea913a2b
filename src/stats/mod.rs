//! Stats module - descriptive statistics and correlation

mod calculator;
mod correlation;

pub use calculator::{CategoryCount, FieldStats, ScoreShare, StatsCalculator, LIKERT_SCORES};
pub use correlation::{pearson, Correlation, CorrelationStrength, LinearFit};
