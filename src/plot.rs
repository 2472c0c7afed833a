//! SVG charts for calibration and cumulative profit
//!
//! Rendering only: the series come from [`crate::core::calibration`] and
//! [`crate::backtesting::metrics`].

use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

use crate::core::calibration::CalibrationBin;

const GRAY: RGBColor = RGBColor(128, 128, 128);

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Nothing to plot: {0}")]
    Empty(&'static str),

    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

fn draw_err<E: Display>(e: E) -> PlotError {
    PlotError::Draw(e.to_string())
}

/// Observed home-win rate against mean forecast, with the diagonal for reference
pub fn draw_calibration_chart<P: AsRef<Path>>(
    path: P,
    bins: &[CalibrationBin],
) -> Result<(), PlotError> {
    if bins.is_empty() {
        return Err(PlotError::Empty("calibration curve has no bins"));
    }

    let root = SVGBackend::new(path.as_ref(), (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Calibration Plot", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("Fair Home Win Probability")
        .y_desc("Observed Home Win Rate")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(vec![(0.0, 0.0), (1.0, 1.0)], &GRAY))
        .map_err(draw_err)?
        .label("Perfect Calibration")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GRAY));

    let points: Vec<(f64, f64)> = bins
        .iter()
        .map(|b| (b.avg_predicted, b.observed_rate))
        .collect();

    chart
        .draw_series(LineSeries::new(points.clone(), &BLUE))
        .map_err(draw_err)?
        .label("Observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
        .map_err(draw_err)?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Y range covering the series and zero, padded by 5%
fn profit_range(cumulative: &[f64]) -> (f64, f64) {
    let low = cumulative.iter().copied().fold(0.0f64, f64::min);
    let high = cumulative.iter().copied().fold(0.0f64, f64::max);
    let pad = ((high - low) * 0.05).max(1.0);
    (low - pad, high + pad)
}

/// Cumulative profit by bet number
pub fn draw_cumulative_profit<P: AsRef<Path>>(
    path: P,
    cumulative: &[f64],
) -> Result<(), PlotError> {
    if cumulative.is_empty() {
        return Err(PlotError::Empty("profit series is empty"));
    }

    let (low, high) = profit_range(cumulative);
    let bets = cumulative.len();

    let root = SVGBackend::new(path.as_ref(), (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Cumulative Profit from Level-Stake Betting", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..bets, low..high)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc("Bet Number")
        .y_desc("Cumulative Profit")
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(vec![(0, 0.0), (bets, 0.0)], &GRAY))
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(
            cumulative.iter().enumerate().map(|(i, &v)| (i + 1, v)),
            &BLUE,
        ))
        .map_err(draw_err)?
        .label("Cumulative Profit")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}
