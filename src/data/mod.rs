//! Data module - survey loading and reshaping

mod loader;
mod normalizer;
mod series;

pub use loader::{LoaderError, RawGrid, SurveyLoader};
pub use normalizer::{NormalizerError, RespondentTable, SurveyNormalizer, RESPONDENT_COLUMN};
pub use series::{coerce, AlignedPair, AlignmentStrategy, Series};
