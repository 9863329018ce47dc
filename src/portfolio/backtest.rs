//! # Backtest
//!
//! $$
//! r^p_t = \sum_i w_i r_{i,t},\qquad
//! G_t = \prod_{k\le t}(1+r^p_k),\qquad
//! R_{ann} = G_T^{252/T}-1
//! $$
//!
//! Buy-and-hold evaluation of a fixed allocation over historical returns
//! (no rebalancing, no costs).

use statrs::statistics::Statistics;

use super::data::ReturnSeries;
use super::types::sharpe_ratio;
use super::types::BacktestReport;
use super::types::PerformanceSummary;
use super::types::RiskFreeRate;
use super::types::WeightVector;
use super::types::TRADING_DAYS;
use crate::error::PortfolioError;
use crate::error::Result;

/// Replay `weights` over `returns` and summarize realized performance.
pub fn backtest(
  weights: &WeightVector,
  returns: &ReturnSeries,
  risk_free: RiskFreeRate,
) -> Result<BacktestReport> {
  if weights.len() != returns.assets().len() {
    return Err(PortfolioError::invalid(
      "weights",
      format!(
        "expected {} weights, got {}",
        returns.assets().len(),
        weights.len()
      ),
    ));
  }
  let n = returns.n_periods();
  if n < 2 {
    return Err(PortfolioError::data(
      returns.assets().join(","),
      "backtest needs at least 2 return rows",
    ));
  }

  let daily_returns: Vec<f64> = returns
    .values()
    .outer_iter()
    .map(|row| row.iter().zip(weights.iter()).map(|(r, w)| r * w).sum())
    .collect();

  let cumulative_returns: Vec<f64> = daily_returns
    .iter()
    .scan(1.0, |growth, r| {
      *growth *= 1.0 + r;
      Some(*growth)
    })
    .collect();

  let final_growth = cumulative_returns[n - 1];
  let total_return = final_growth - 1.0;
  let annualized_return = final_growth.powf(TRADING_DAYS / n as f64) - 1.0;
  let annualized_volatility = daily_returns.iter().std_dev() * TRADING_DAYS.sqrt();
  let sharpe = sharpe_ratio(annualized_return - risk_free.annualized(), annualized_volatility);

  Ok(BacktestReport {
    dates: returns.dates().to_vec(),
    daily_returns,
    cumulative_returns,
    summary: PerformanceSummary {
      total_return,
      annualized_return,
      annualized_volatility,
      sharpe_ratio: sharpe,
    },
  })
}
