use clap::{Parser, ValueEnum};
use survey_scope::data::AlignmentStrategy;

/// How answers to two questions are paired for correlation.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Pair the n-th valid answer of each question (default).
    Positional,
    /// Pair answers given by the same respondent.
    Respondent,
}

impl From<Alignment> for AlignmentStrategy {
    fn from(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Positional => AlignmentStrategy::Positional,
            Alignment::Respondent => AlignmentStrategy::ByRespondent,
        }
    }
}

/// Summarises a questionnaire export and renders its charts.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The survey export: one question per row, one respondent per column.
    #[clap(value_parser)]
    pub input: String,

    /// (file path, optional) JSON file with the label -> field table. Built-in defaults otherwise.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory) Where charts and summary.json are written.
    #[clap(short, long, value_parser, default_value = "output")]
    pub out_dir: String,

    /// Pairing used for two-question comparisons.
    #[clap(long, value_enum, default_value = "positional")]
    pub alignment: Alignment,

    /// Skip chart rendering.
    #[clap(long, takes_value = false)]
    pub no_charts: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
