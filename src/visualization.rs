//! # Visualization
//!
//! $$
//! \{(\sigma_k, R_k, S_k)\}_{k=1}^m \mapsto \text{scatter},\qquad
//! \{G_t\} \mapsto \text{line}
//! $$
//!
//! Plotly charts for the frontier sweep and the backtest. Callers decide
//! whether to `show()` or `write_html()` the returned plot.

use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::color::NamedColor;
use plotly::common::ColorBar;
use plotly::common::ColorScale;
use plotly::common::ColorScalePalette;
use plotly::common::Line;
use plotly::common::Marker;
use plotly::common::MarkerSymbol;
use plotly::common::Mode;
use plotly::common::Title;
use plotly::layout::Axis;

use crate::portfolio::types::BacktestReport;
use crate::portfolio::types::FrontierPoint;
use crate::portfolio::types::PortfolioPerformance;

/// Volatility/return scatter coloured by Sharpe ratio, with the optimal
/// allocation as a star when given.
pub fn frontier_chart(points: &[FrontierPoint], optimal: Option<&PortfolioPerformance>) -> Plot {
  let vols: Vec<f64> = points.iter().map(|p| p.volatility).collect();
  let rets: Vec<f64> = points.iter().map(|p| p.expected_return).collect();
  let sharpes: Vec<f64> = points.iter().map(|p| p.sharpe).collect();
  let hover: Vec<String> = points
    .iter()
    .map(|p| {
      let weights = p
        .weights
        .iter()
        .map(|w| format!("{:.1}%", w * 100.0))
        .collect::<Vec<_>>()
        .join(", ");
      format!("sharpe: {:.3}<br>weights: {weights}", p.sharpe)
    })
    .collect();

  let mut plot = Plot::new();
  plot.add_trace(
    Scatter::new(vols, rets)
      .mode(Mode::Markers)
      .name("Random portfolios")
      .hover_text_array(hover)
      .marker(
        Marker::new()
          .size(5)
          .color_array(sharpes)
          .color_scale(ColorScale::Palette(ColorScalePalette::Viridis))
          .show_scale(true)
          .color_bar(ColorBar::new().title(Title::from("Sharpe Ratio"))),
      ),
  );

  if let Some(best) = optimal {
    plot.add_trace(
      Scatter::new(vec![best.volatility], vec![best.expected_return])
        .mode(Mode::Markers)
        .name(format!("Max Sharpe ({:.3})", best.sharpe).as_str())
        .marker(
          Marker::new()
            .symbol(MarkerSymbol::Star)
            .size(16)
            .color(NamedColor::Red),
        ),
    );
  }

  plot.set_layout(
    Layout::new()
      .title(Title::from("Efficient Frontier"))
      .x_axis(Axis::new().title(Title::from("Annualized volatility")))
      .y_axis(Axis::new().title(Title::from("Annualized return"))),
  );
  plot
}

/// Growth of one unit invested in the allocation.
pub fn cumulative_returns_chart(report: &BacktestReport) -> Plot {
  let dates: Vec<String> = report.dates.iter().map(|d| d.to_string()).collect();

  let mut plot = Plot::new();
  plot.add_trace(
    Scatter::new(dates, report.cumulative_returns.clone())
      .mode(Mode::Lines)
      .name("Portfolio")
      .line(Line::new().width(1.5)),
  );
  plot.set_layout(
    Layout::new()
      .title(Title::from(
        format!(
          "Backtest: total {:.2}%, Sharpe {:.2}",
          report.summary.total_return * 100.0,
          report.summary.sharpe_ratio
        )
        .as_str(),
      ))
      .x_axis(Axis::new().title(Title::from("Date")))
      .y_axis(Axis::new().title(Title::from("Cumulative return"))),
  );
  plot
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::portfolio::types::PerformanceSummary;

  #[test]
  fn frontier_chart_marks_the_optimum() {
    let points = vec![
      FrontierPoint {
        volatility: 0.2,
        expected_return: 0.1,
        sharpe: 0.5,
        weights: vec![0.5, 0.5],
      },
      FrontierPoint {
        volatility: 0.25,
        expected_return: 0.15,
        sharpe: 0.6,
        weights: vec![0.2, 0.8],
      },
    ];
    let best = PortfolioPerformance {
      expected_return: 0.14,
      volatility: 0.21,
      sharpe: 0.67,
    };
    let json = frontier_chart(&points, Some(&best)).to_json();
    assert!(json.contains("Sharpe Ratio"));
    assert!(json.contains("Max Sharpe (0.670)"));
    assert!(json.contains("Efficient Frontier"));

    let json = frontier_chart(&points, None).to_json();
    assert!(!json.contains("Max Sharpe"));
  }

  #[test]
  fn cumulative_chart_uses_report_dates() {
    let report = BacktestReport {
      dates: vec![
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
      ],
      daily_returns: vec![0.01, -0.005],
      cumulative_returns: vec![1.01, 1.00495],
      summary: PerformanceSummary::default(),
    };
    let json = cumulative_returns_chart(&report).to_json();
    assert!(json.contains("2024-01-03"));
    assert!(json.contains("Cumulative return"));
  }
}
