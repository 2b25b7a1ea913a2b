//! Charts module - static chart rendering

mod layout;
mod renderer;

pub use layout::{beeswarm_positions, box_summary, histogram_bins, padded_range, Bin, BoxSummary};
pub use renderer::{ChartOptions, MeanBar, StaticChartRenderer, PALETTE};
