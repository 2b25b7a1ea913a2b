//! Survey Scope - questionnaire export reshaping & analysis
//!
//! Loads a question-per-row survey export, reshapes it into numeric series or
//! a respondent-indexed table, and derives statistics and charts from them.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;
