//! Survey Report Module
//! Assembles per-field statistics, comparisons and correlations, then prints,
//! serialises or charts them.

use crate::config::{FieldMapping, FieldName};
use crate::data::{
    AlignedPair, AlignmentStrategy, NormalizerError, RawGrid, Series, SurveyNormalizer,
};
use crate::charts::{ChartOptions, MeanBar, StaticChartRenderer};
use crate::stats::{pearson, CategoryCount, Correlation, FieldStats, ScoreShare, StatsCalculator};
use log::{debug, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Numeric fields summarised, in print order.
const SUMMARY_FIELDS: [&str; 6] = [
    FieldName::AGE,
    FieldName::SOCCER_INTEREST,
    FieldName::TECH_AFFINITY,
    FieldName::DIGITAL_PREFERENCE,
    FieldName::DIGITAL_SATISFACTION,
    FieldName::TRADITIONAL_SATISFACTION,
];

/// Comparisons read from the question rows, paired by the chosen alignment.
const ROW_PAIRS: [(&str, &str); 3] = [
    (FieldName::SOCCER_INTEREST, FieldName::TECH_AFFINITY),
    (FieldName::SOCCER_INTEREST, FieldName::DIGITAL_PREFERENCE),
    (FieldName::TECH_AFFINITY, FieldName::DIGITAL_PREFERENCE),
];

/// Comparisons read from the respondent table after dropping anyone missing
/// one of [`COMPLETE_CASE_FIELDS`].
const TABLE_PAIRS: [(&str, &str); 2] = [
    (FieldName::TECH_AFFINITY, FieldName::DIGITAL_SATISFACTION),
    (FieldName::DIGITAL_PREFERENCE, FieldName::DIGITAL_SATISFACTION),
];

const COMPLETE_CASE_FIELDS: [&str; 3] = [
    FieldName::TECH_AFFINITY,
    FieldName::DIGITAL_SATISFACTION,
    FieldName::DIGITAL_PREFERENCE,
];

/// Exhibitions compared side by side.
const EXHIBITIONS: [&str; 2] = [
    FieldName::DIGITAL_SATISFACTION,
    FieldName::TRADITIONAL_SATISFACTION,
];

/// What the survey holds for one field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FieldStatus {
    /// No question maps to the field.
    Absent,
    /// The question exists but no answer is numeric.
    Empty,
    Present {
        stats: FieldStats,
        #[serde(skip_serializing_if = "Option::is_none")]
        likert: Option<Vec<ScoreShare>>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub field: FieldName,
    pub display: String,
    #[serde(flatten)]
    pub status: FieldStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub x: FieldName,
    pub y: FieldName,
    pub aligned_len: usize,
    pub correlation: Option<Correlation>,
}

/// Mean satisfaction with one exhibition.
#[derive(Debug, Clone, Serialize)]
pub struct ExhibitionSatisfaction {
    pub field: FieldName,
    pub display: String,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

impl PairSummary {
    fn of(pair: &AlignedPair) -> Self {
        Self {
            x: pair.x.field.clone(),
            y: pair.y.field.clone(),
            aligned_len: pair.len(),
            correlation: pearson(pair),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SurveyReport {
    pub respondent_count: usize,
    pub shape: (usize, usize),
    pub columns: Vec<FieldName>,
    pub alignment: AlignmentStrategy,
    pub fields: Vec<FieldSummary>,
    pub occupations: Option<Vec<CategoryCount>>,
    pub satisfaction: Vec<ExhibitionSatisfaction>,
    pub correlations: Vec<PairSummary>,
    #[serde(skip)]
    series: Vec<Series>,
    #[serde(skip)]
    pairs: Vec<AlignedPair>,
    #[serde(skip)]
    mapping: FieldMapping,
}

impl SurveyReport {
    /// Derive every view of the survey from one raw grid.
    pub fn build(
        grid: &RawGrid,
        normalizer: &SurveyNormalizer,
        alignment: AlignmentStrategy,
    ) -> Result<Self, NormalizerError> {
        let mapping = normalizer.mapping().clone();
        let table = normalizer.reorient_questionnaire(grid)?;

        let series: Vec<Series> = SUMMARY_FIELDS
            .iter()
            .filter_map(|name| table.series(&FieldName::new(*name)))
            .collect();
        let mut described = StatsCalculator::describe_all_parallel(&series);

        let fields: Vec<FieldSummary> = SUMMARY_FIELDS
            .iter()
            .map(|name| {
                let field = FieldName::new(*name);
                let status = match described.remove(&field) {
                    None => FieldStatus::Absent,
                    Some(None) => FieldStatus::Empty,
                    Some(Some(stats)) => {
                        let likert = (field.as_str() != FieldName::AGE)
                            .then(|| Self::likert_for(&series, &field))
                            .flatten();
                        FieldStatus::Present { stats, likert }
                    }
                };
                FieldSummary {
                    display: mapping.display_label(&field),
                    field,
                    status,
                }
            })
            .collect();

        let occupations = normalizer
            .labels_for_field(grid, &FieldName::new(FieldName::OCCUPATION))
            .map(|labels| StatsCalculator::category_counts(&labels));

        let satisfaction = Self::satisfaction_of(&fields);

        let mut correlations = Vec::new();
        let mut pairs = Vec::new();
        for (x_name, y_name) in ROW_PAIRS {
            let x = normalizer.series_for_field(grid, &FieldName::new(x_name));
            let y = normalizer.series_for_field(grid, &FieldName::new(y_name));
            let (Some(x), Some(y)) = (x, y) else {
                warn!("Skipping {} vs {}: field absent", x_name, y_name);
                continue;
            };
            let pair = AlignedPair::align(&x, &y, alignment);
            correlations.push(PairSummary::of(&pair));
            pairs.push(pair);
        }

        let required: Vec<FieldName> = COMPLETE_CASE_FIELDS
            .iter()
            .map(|name| FieldName::new(*name))
            .collect();
        if let Some(missing) = required.iter().find(|f| !table.has_field(f)) {
            warn!("Skipping satisfaction comparisons: {} absent", missing);
        } else {
            let complete = table.complete_cases(&required)?;
            debug!(
                "{} complete cases for satisfaction comparisons",
                complete.respondent_count()
            );
            for (x_name, y_name) in TABLE_PAIRS {
                let x = complete.series(&FieldName::new(x_name));
                let y = complete.series(&FieldName::new(y_name));
                let (Some(x), Some(y)) = (x, y) else {
                    warn!("Skipping {} vs {}: field not numeric", x_name, y_name);
                    continue;
                };
                let pair = AlignedPair::by_respondent(&x, &y);
                correlations.push(PairSummary::of(&pair));
                pairs.push(pair);
            }
        }

        info!(
            "Survey summarised: {} respondents, {} fields, {} comparisons",
            table.respondent_count(),
            table.fields().len(),
            correlations.len()
        );

        Ok(Self {
            respondent_count: table.respondent_count(),
            shape: table.shape(),
            columns: table.fields().to_vec(),
            alignment,
            fields,
            occupations,
            satisfaction,
            correlations,
            series,
            pairs,
            mapping,
        })
    }

    fn satisfaction_of(fields: &[FieldSummary]) -> Vec<ExhibitionSatisfaction> {
        EXHIBITIONS
            .iter()
            .filter_map(|name| fields.iter().find(|f| f.field.as_str() == *name))
            .filter_map(|summary| match &summary.status {
                FieldStatus::Present { stats, .. } => Some(ExhibitionSatisfaction {
                    field: summary.field.clone(),
                    display: summary.display.clone(),
                    mean: stats.mean,
                    std: stats.std,
                    count: stats.count,
                }),
                _ => None,
            })
            .collect()
    }

    fn likert_for(series: &[Series], field: &FieldName) -> Option<Vec<ScoreShare>> {
        series
            .iter()
            .find(|s| &s.field == field)
            .map(StatsCalculator::likert_distribution)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSummary> {
        self.fields.iter().find(|f| f.field.as_str() == name)
    }

    /// Human readable summary on stdout.
    pub fn print_summary(&self) {
        println!("=== Visitor Survey Analysis Results ===\n");
        println!("Total respondents: {}", self.respondent_count);

        for summary in &self.fields {
            match &summary.status {
                FieldStatus::Absent => {}
                FieldStatus::Empty => println!("{}: no data", summary.display),
                FieldStatus::Present { stats, .. } if summary.field.as_str() == FieldName::AGE => {
                    println!(
                        "{}: mean {:.1} ({:.0}-{:.0}), N={}",
                        summary.display, stats.mean, stats.min, stats.max, stats.count
                    )
                }
                FieldStatus::Present { stats, likert } => {
                    println!("{}: {:.1}/5 (N={})", summary.display, stats.mean, stats.count);
                    for share in likert.iter().flatten() {
                        println!(
                            "  score {}: {} ({:.1}%)",
                            share.score, share.count, share.percentage
                        );
                    }
                }
            }
        }

        if let Some(occupations) = &self.occupations {
            println!("\n=== Occupations ===");
            for c in occupations {
                println!("  {}: {} ({:.1}%)", c.label, c.count, c.percentage);
            }
        }

        if !self.satisfaction.is_empty() {
            println!("\n=== Satisfaction Comparison ===");
            for exhibition in &self.satisfaction {
                println!(
                    "{}: {:.2} ± {:.2} (N={})",
                    exhibition.display, exhibition.mean, exhibition.std, exhibition.count
                );
            }
        }

        println!("\n=== Correlation Analysis ({:?} alignment) ===", self.alignment);
        for pair in &self.correlations {
            let x = self.mapping.display_label(&pair.x);
            let y = self.mapping.display_label(&pair.y);
            match &pair.correlation {
                Some(c) => println!(
                    "{} vs {}: r = {:.3}, p = {:.3}, n = {} ({})",
                    x, y, c.r, c.p_value, c.n, c.strength
                ),
                None => println!("{} vs {}: not enough data (n = {})", x, y, pair.aligned_len),
            }
        }

        println!("\n=== Available columns ===");
        for column in &self.columns {
            println!("  - {}", column);
        }
        println!("\nData shape: {:?}", self.shape);
    }

    pub fn write_json(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Summary written to {}", path.display());
        Ok(())
    }

    /// Render every chart into `out_dir`, returning the written paths.
    pub fn render_charts(&self, out_dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
        fs::create_dir_all(out_dir)?;
        let mut written = Vec::new();

        for series in &self.series {
            let display = self.mapping.display_label(&series.field);
            let path = out_dir.join(format!("{}_histogram.png", Self::file_stem(&series.field)));
            let opts = if series.field.as_str() == FieldName::AGE {
                ChartOptions::titled(format!("{} Distribution", display))
                    .with_labels(display.as_str(), "Count")
                    .with_bins(8)
            } else {
                ChartOptions::titled(format!("{} Distribution", display))
                    .with_labels("Rating (1-5)", "Count")
                    .with_bins(5)
                    .likert()
            };
            StaticChartRenderer::histogram(series, &opts, &path)?;
            written.push(path);
        }

        let exhibitions: Vec<(String, &Series)> = self
            .series
            .iter()
            .filter(|s| {
                s.field.as_str() == FieldName::DIGITAL_SATISFACTION
                    || s.field.as_str() == FieldName::TRADITIONAL_SATISFACTION
            })
            .map(|s| (self.mapping.display_label(&s.field), s))
            .collect();
        if !exhibitions.is_empty() {
            let path = out_dir.join("satisfaction_box_plot.png");
            let opts = ChartOptions::titled("Exhibition Satisfaction Distribution Comparison")
                .with_labels("", "Satisfaction score")
                .likert();
            StaticChartRenderer::box_plot(&exhibitions, &opts, &path)?;
            written.push(path);
        }

        if !self.satisfaction.is_empty() {
            let bars: Vec<MeanBar> = self
                .satisfaction
                .iter()
                .map(|e| MeanBar {
                    label: e.display.clone(),
                    mean: e.mean,
                    std: e.std,
                    count: e.count,
                })
                .collect();
            let path = out_dir.join("satisfaction_comparison.png");
            let opts = ChartOptions::titled("Exhibition Satisfaction Comparison")
                .with_labels("", "Mean satisfaction (1-5)");
            StaticChartRenderer::mean_bar(&bars, &opts, &path)?;
            written.push(path);
        }

        if let Some(occupations) = &self.occupations {
            let path = out_dir.join("occupation_bar.png");
            let opts = ChartOptions::titled("Occupation Distribution").with_labels("", "Count");
            StaticChartRenderer::category_bar(occupations, &opts, &path)?;
            written.push(path);
        }

        for (pair, summary) in self.pairs.iter().zip(&self.correlations) {
            let x = self.mapping.display_label(&summary.x);
            let y = self.mapping.display_label(&summary.y);
            let path = out_dir.join(format!(
                "{}_vs_{}_scatter.png",
                Self::file_stem(&summary.x),
                Self::file_stem(&summary.y)
            ));
            let opts = ChartOptions::titled(format!("{} vs {}", x, y))
                .with_labels(x.as_str(), y.as_str())
                .likert();
            StaticChartRenderer::scatter(pair, summary.correlation.as_ref(), &opts, &path)?;
            written.push(path);
        }

        info!("{} charts written to {}", written.len(), out_dir.display());
        Ok(written)
    }

    fn file_stem(field: &FieldName) -> String {
        field
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect()
    }
}
