//! Static Chart Renderer
//! Draws PNG charts from series with plotters' bitmap backend.
//!
//! Every chart type falls back to a "No data" image when its input is empty,
//! so an unanswered question never aborts a report run.

use crate::charts::layout::{beeswarm_positions, box_summary, histogram_bins, padded_range};
use crate::data::{AlignedPair, Series};
use crate::stats::{CategoryCount, Correlation, StatsCalculator};
use log::debug;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);
const DIGITAL: RGBColor = RGBColor(255, 107, 107);
const TRADITIONAL: RGBColor = RGBColor(78, 205, 196);
const SCATTER: RGBColor = RGBColor(128, 0, 128);
const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// Palette for multi-series charts, cycled in order.
pub const PALETTE: [RGBColor; 4] = [DIGITAL, TRADITIONAL, SKY_BLUE, ORANGE];

/// Display options handed to every chart.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub size: (u32, u32),
    pub bins: usize,
    /// Fixed value-axis range; derived from the data when `None`.
    pub value_range: Option<(f64, f64)>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: "Count".to_string(),
            size: (1200, 800),
            bins: 10,
            value_range: None,
        }
    }
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Axis range suited to 1-5 rating questions.
    pub fn likert(mut self) -> Self {
        self.value_range = Some((0.5, 5.5));
        self
    }
}

/// One bar of a mean comparison, drawn with a ±std error bar.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanBar {
    pub label: String,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Histogram with mean and median markers.
    pub fn histogram(
        series: &Series,
        opts: &ChartOptions,
        path: &Path,
    ) -> Result<(), Box<dyn Error>> {
        let Some(stats) = StatsCalculator::describe(series) else {
            return Self::no_data(opts, path);
        };
        let bins = histogram_bins(series.values(), opts.bins.max(1));
        let (x_lo, x_hi) = match opts.value_range {
            Some(range) => range,
            None => (bins[0].start, bins[bins.len() - 1].end),
        };
        let y_max = bins.iter().map(|b| b.count).max().unwrap_or(1) as f64 * 1.15;

        let root = BitMapBackend::new(path, opts.size).into_drawing_area();
        root.fill(&WHITE)?;
        let caption = format!(
            "{} (N={}, mean {:.1}, median {:.1}, std {:.1})",
            opts.title, stats.count, stats.mean, stats.median, stats.std
        );
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_desc(opts.x_label.as_str())
            .y_desc(opts.y_label.as_str())
            .draw()?;

        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], SKY_BLUE.mix(0.7).filled())
        }))?;
        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))
        }))?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(stats.mean, 0.0), (stats.mean, y_max)],
                RED.stroke_width(2),
            )))?
            .label(format!("Mean: {:.1}", stats.mean))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(stats.median, 0.0), (stats.median, y_max)],
                ORANGE.stroke_width(2),
            )))?
            .label(format!("Median: {:.1}", stats.median))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        debug!("Histogram written to {}", path.display());
        Ok(())
    }

    /// Side-by-side box plots with every answer overlaid.
    pub fn box_plot(
        groups: &[(String, &Series)],
        opts: &ChartOptions,
        path: &Path,
    ) -> Result<(), Box<dyn Error>> {
        if groups.iter().all(|(_, s)| s.is_empty()) {
            return Self::no_data(opts, path);
        }

        let (y_lo, y_hi) = opts.value_range.unwrap_or_else(|| {
            padded_range(groups.iter().flat_map(|(_, s)| s.values()), (0.0, 1.0))
        });
        let x_hi = groups.len() as f64 + 0.5;

        let root = BitMapBackend::new(path, opts.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(opts.title.as_str(), ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0.5..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&|_| String::new())
            .y_desc(opts.y_label.as_str())
            .draw()?;

        for (i, (label, series)) in groups.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let x = i as f64 + 1.0;

            let Some(summary) = box_summary(series.values()) else {
                continue;
            };

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.25, summary.q1), (x + 0.25, summary.q3)],
                    color.mix(0.3).filled(),
                )))?
                .label(format!("{} (N={}, mean {:.2})", label, series.len(), summary.mean))
                .legend(move |(lx, ly)| {
                    Rectangle::new([(lx, ly - 5), (lx + 10, ly + 5)], color.filled())
                });

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.25, summary.q1), (x + 0.25, summary.q3)],
                color.stroke_width(2),
            )))?;

            let segments = vec![
                vec![(x - 0.25, summary.median), (x + 0.25, summary.median)],
                vec![(x, summary.q3), (x, summary.whisker_high)],
                vec![(x, summary.q1), (x, summary.whisker_low)],
                vec![(x - 0.1, summary.whisker_high), (x + 0.1, summary.whisker_high)],
                vec![(x - 0.1, summary.whisker_low), (x + 0.1, summary.whisker_low)],
            ];
            chart.draw_series(
                segments
                    .into_iter()
                    .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
            )?;

            let xs = beeswarm_positions(series.values(), x, 0.3);
            chart.draw_series(
                xs.iter()
                    .zip(series.values())
                    .map(|(&px, &py)| Circle::new((px, py), 4, color.mix(0.6).filled())),
            )?;

            chart.draw_series(std::iter::once(Circle::new(
                (x, summary.mean),
                5,
                BLACK.filled(),
            )))?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        debug!("Box plot written to {}", path.display());
        Ok(())
    }

    /// Scatter plot of an aligned pair with its least-squares line.
    pub fn scatter(
        pair: &AlignedPair,
        correlation: Option<&Correlation>,
        opts: &ChartOptions,
        path: &Path,
    ) -> Result<(), Box<dyn Error>> {
        if pair.is_empty() {
            return Self::no_data(opts, path);
        }

        let (x_lo, x_hi) = opts
            .value_range
            .unwrap_or_else(|| padded_range(pair.x.values(), (0.0, 1.0)));
        let (y_lo, y_hi) = opts
            .value_range
            .unwrap_or_else(|| padded_range(pair.y.values(), (0.0, 1.0)));

        let caption = match correlation {
            Some(c) => format!(
                "{} (r = {:.3}, p = {:.3}, n = {}, {})",
                opts.title, c.r, c.p_value, c.n, c.strength
            ),
            None => format!("{} (n = {})", opts.title, pair.len()),
        };

        let root = BitMapBackend::new(path, opts.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 22))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc(opts.x_label.as_str())
            .y_desc(opts.y_label.as_str())
            .draw()?;

        chart.draw_series(
            pair.points()
                .map(|(x, y)| Circle::new((x, y), 6, SCATTER.mix(0.7).filled())),
        )?;
        chart.draw_series(
            pair.points()
                .map(|(x, y)| Circle::new((x, y), 6, BLACK.stroke_width(1))),
        )?;

        if let Some(c) = correlation {
            let line = vec![(x_lo, c.fit.predict(x_lo)), (x_hi, c.fit.predict(x_hi))];
            chart.draw_series(LineSeries::new(line, RED.stroke_width(2)))?;
        }

        root.present()?;
        debug!("Scatter plot written to {}", path.display());
        Ok(())
    }

    /// Mean of each group as a bar, with ±std error bars.
    pub fn mean_bar(
        bars: &[MeanBar],
        opts: &ChartOptions,
        path: &Path,
    ) -> Result<(), Box<dyn Error>> {
        if bars.is_empty() {
            return Self::no_data(opts, path);
        }

        let (y_lo, y_hi) = opts.value_range.unwrap_or_else(|| {
            let top = bars.iter().map(|b| b.mean + b.std).fold(0.0, f64::max);
            (0.0, (top * 1.15).max(5.5))
        });
        let x_hi = bars.len() as f64 + 0.5;
        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();

        let root = BitMapBackend::new(path, opts.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(opts.title.as_str(), ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(0.5..x_hi, y_lo..y_hi)?;

        let label_for = |x: &f64| {
            let nearest = x.round();
            if (x - nearest).abs() < 1e-6 && nearest >= 1.0 {
                labels.get(nearest as usize - 1).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len() * 2 + 1)
            .x_label_formatter(&label_for)
            .y_desc(opts.y_label.as_str())
            .draw()?;

        for (i, bar) in bars.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let x = i as f64 + 1.0;

            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.3, 0.0), (x + 0.3, bar.mean)],
                color.mix(0.8).filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.3, 0.0), (x + 0.3, bar.mean)],
                BLACK.stroke_width(1),
            )))?;
            chart.draw_series(std::iter::once(ErrorBar::new_vertical(
                x,
                bar.mean - bar.std,
                bar.mean,
                bar.mean + bar.std,
                BLACK.stroke_width(2),
                20,
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.2} (N={})", bar.mean, bar.count),
                (x - 0.15, bar.mean + bar.std + 0.1),
                ("sans-serif", 18).into_font(),
            )))?;
        }

        root.present()?;
        debug!("Mean bar chart written to {}", path.display());
        Ok(())
    }

    /// Frequency bar chart for a categorical question.
    pub fn category_bar(
        counts: &[CategoryCount],
        opts: &ChartOptions,
        path: &Path,
    ) -> Result<(), Box<dyn Error>> {
        if counts.is_empty() {
            return Self::no_data(opts, path);
        }

        let n = counts.len() as u32;
        let y_max = counts.iter().map(|c| c.count).max().unwrap_or(1) as u32 + 1;
        let labels: Vec<String> = counts.iter().map(|c| c.label.clone()).collect();
        let total: usize = counts.iter().map(|c| c.count).sum();

        let root = BitMapBackend::new(path, opts.size).into_drawing_area();
        root.fill(&WHITE)?;
        let caption = format!("{} (N={}, {} categories)", opts.title, total, counts.len());
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d((0u32..n).into_segmented(), 0u32..y_max)?;

        let label_for = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(counts.len())
            .x_label_formatter(&label_for)
            .y_desc(opts.y_label.as_str())
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(LIGHT_CORAL.mix(0.7).filled())
                .margin(10)
                .data(counts.iter().enumerate().map(|(i, c)| (i as u32, c.count as u32))),
        )?;

        chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
            Text::new(
                c.count.to_string(),
                (SegmentValue::CenterOf(i as u32), c.count as u32),
                ("sans-serif", 16).into_font(),
            )
        }))?;

        root.present()?;
        debug!("Bar chart written to {}", path.display());
        Ok(())
    }

    fn no_data(opts: &ChartOptions, path: &Path) -> Result<(), Box<dyn Error>> {
        let (w, h) = opts.size;
        let root = BitMapBackend::new(path, opts.size).into_drawing_area();
        root.fill(&WHITE)?;
        let body = root.titled(opts.title.as_str(), ("sans-serif", 24))?;
        body.draw(&Text::new(
            "No data",
            (w as i32 / 2 - 60, h as i32 / 2 - 40),
            ("sans-serif", 36).into_font().color(&BLACK),
        ))?;
        root.present()?;
        debug!("No data for {}; placeholder written to {}", opts.title, path.display());
        Ok(())
    }
}
