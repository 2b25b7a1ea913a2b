//! Survey Scope - questionnaire export analysis
//!
//! Reads a survey export, prints a summary, and writes charts plus a JSON summary.

mod args;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use log::{debug, info};
use std::path::Path;
use survey_scope::config::SurveyConfig;
use survey_scope::data::{SurveyLoader, SurveyNormalizer};
use survey_scope::report::SurveyReport;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("{:?}", args);

    let config = match &args.config {
        Some(path) => SurveyConfig::from_file(Path::new(path))
            .with_context(|| format!("loading config {}", path))?,
        None => SurveyConfig::default(),
    };

    let grid = SurveyLoader::new()
        .with_delimiter(config.delimiter_byte()?)
        .load_path(Path::new(&args.input))
        .with_context(|| format!("loading survey export {}", args.input))?;
    info!("Loaded {} rows from {}", grid.height(), args.input);

    let normalizer = SurveyNormalizer::new(config.mapping());
    let report = SurveyReport::build(&grid, &normalizer, args.alignment.into())
        .context("reshaping survey export")?;
    report.print_summary();

    let out_dir = Path::new(&args.out_dir);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    report
        .write_json(&out_dir.join("summary.json"))
        .map_err(|e| anyhow::anyhow!("writing summary: {}", e))?;

    if !args.no_charts {
        let written = report
            .render_charts(out_dir)
            .map_err(|e| anyhow::anyhow!("rendering charts: {}", e))?;
        for path in written {
            println!("✓ {}", path.display());
        }
    }

    Ok(())
}
