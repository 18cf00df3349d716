//! Plot descriptions handed to the external chart renderer.

pub mod gnuplot;

pub use gnuplot::{LineSeries, bar_chart_script, line_chart_script};
