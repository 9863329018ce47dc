//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}\in\Delta} \frac{252\,\mathbf{w}^\top\mu-r_f}{\sqrt{252\,\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Shared value types and annualization constants for the allocation pipeline.

use std::ops::Deref;

use chrono::NaiveDate;

use crate::error::PortfolioError;
use crate::error::Result;

/// Trading days per year used for every annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Weights must sum to one within this tolerance.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Sharpe ratio with the zero-volatility convention used crate-wide.
pub(crate) fn sharpe_ratio(excess_return: f64, volatility: f64) -> f64 {
  if volatility > 1e-15 {
    excess_return / volatility
  } else {
    0.0
  }
}

/// Short-term risk-free rate, stored on a daily scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskFreeRate {
  daily: f64,
}

impl RiskFreeRate {
  pub fn from_daily(daily: f64) -> Result<Self> {
    if !daily.is_finite() {
      return Err(PortfolioError::invalid("risk_free_rate", "must be finite"));
    }
    Ok(Self { daily })
  }

  /// Average annual percentage yields (e.g. `4.5` for 4.5%) into a daily rate.
  pub fn from_annual_percent_yields(proxy: &str, yields: &[f64]) -> Result<Self> {
    let usable: Vec<f64> = yields.iter().copied().filter(|y| y.is_finite()).collect();
    if usable.is_empty() {
      return Err(PortfolioError::data(proxy, "no usable yield observations"));
    }
    let mean_pct = usable.iter().sum::<f64>() / usable.len() as f64;
    Self::from_daily(mean_pct / 100.0 / TRADING_DAYS)
  }

  pub fn daily(&self) -> f64 {
    self.daily
  }

  /// The daily rate scaled to a year; this is what Sharpe ratios subtract.
  pub fn annualized(&self) -> f64 {
    self.daily * TRADING_DAYS
  }
}

/// Long-only, fully invested allocation aligned with the session's assets.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
  /// Checks bounds and the budget constraint.
  pub fn new(weights: Vec<f64>) -> Result<Self> {
    if weights.is_empty() {
      return Err(PortfolioError::invalid("weights", "empty weight vector"));
    }
    for (i, &w) in weights.iter().enumerate() {
      if !w.is_finite() || w < -WEIGHT_SUM_TOLERANCE || w > 1.0 + WEIGHT_SUM_TOLERANCE {
        return Err(PortfolioError::invalid(
          format!("weights[{i}]"),
          format!("{w} is outside [0, 1]"),
        ));
      }
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
      return Err(PortfolioError::invalid(
        "weights",
        format!("weights sum to {total}, expected 1"),
      ));
    }
    Ok(Self(weights.into_iter().map(|w| w.clamp(0.0, 1.0)).collect()))
  }

  /// `1/n` in every slot.
  pub fn uniform(n: usize) -> Result<Self> {
    if n == 0 {
      return Err(PortfolioError::invalid("weights", "empty weight vector"));
    }
    Ok(Self(vec![1.0 / n as f64; n]))
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.0
  }

  pub fn into_inner(self) -> Vec<f64> {
    self.0
  }
}

impl Deref for WeightVector {
  type Target = [f64];

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

/// Model (ex-ante) risk and return of one allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortfolioPerformance {
  /// Annualized expected return.
  pub expected_return: f64,
  /// Annualized volatility.
  pub volatility: f64,
  /// `(expected_return - rf_annual) / volatility`.
  pub sharpe: f64,
}

/// One random portfolio of the frontier sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontierPoint {
  pub volatility: f64,
  pub expected_return: f64,
  pub sharpe: f64,
  pub weights: Vec<f64>,
}

/// Realized (ex-post) statistics of a backtest.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerformanceSummary {
  pub total_return: f64,
  /// Geometric annualization of the compounded growth.
  pub annualized_return: f64,
  pub annualized_volatility: f64,
  pub sharpe_ratio: f64,
}

/// Output of a fixed-weight, no-rebalancing backtest.
#[derive(Clone, Debug)]
pub struct BacktestReport {
  /// Date of each return row.
  pub dates: Vec<NaiveDate>,
  pub daily_returns: Vec<f64>,
  /// Growth of one unit of capital, aligned with `daily_returns`.
  pub cumulative_returns: Vec<f64>,
  pub summary: PerformanceSummary,
}
