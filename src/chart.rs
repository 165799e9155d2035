// PNG price chart for the analyze stage.
use crate::model::{PriceBar, ReportError};
use chrono::Days;
use plotters::prelude::*;
use std::fs;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1280, 640);
const LINE_COLOR: RGBColor = RGBColor(46, 134, 171);

/// Renders a line chart of adjusted close over time for one symbol's bars
/// (sorted by date).
pub fn render_adj_close_chart(
    path: &str,
    symbol: &str,
    bars: &[PriceBar],
) -> Result<(), ReportError> {
    let (first, last) = match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Err(ReportError::Chart(format!("no bars to chart for {symbol}"))),
    };
    // Degenerate ranges make the axis builder unhappy.
    let last = if first == last {
        last + Days::new(1)
    } else {
        last
    };

    let (lo, hi) = bars.iter().fold((f64::MAX, f64::MIN), |(lo, hi), bar| {
        (lo.min(bar.adj_close), hi.max(bar.adj_close))
    });
    let pad = ((hi - lo) * 0.05).max(0.5);
    let (lo, hi) = (lo - pad, hi + pad);

    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ReportError::Chart(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{symbol} - Adjusted Close Price"),
            ("sans-serif", 28),
        )
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(64)
        .build_cartesian_2d(first..last, lo..hi)
        .map_err(|e| ReportError::Chart(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Adjusted Close ($)")
        .draw()
        .map_err(|e| ReportError::Chart(e.to_string()))?;

    chart
        .draw_series(LineSeries::new(
            bars.iter().map(|bar| (bar.date, bar.adj_close)),
            LINE_COLOR.stroke_width(2),
        ))
        .map_err(|e| ReportError::Chart(e.to_string()))?;

    root.present().map_err(|e| ReportError::Chart(e.to_string()))?;
    Ok(())
}
