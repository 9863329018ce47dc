//! # Allocation Performance
//!
//! $$
//! R_p = 252\,\mathbf{w}^\top\mu,\qquad
//! \sigma_p = \sqrt{252}\,\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}},\qquad
//! S_p = \frac{R_p - r_f}{\sigma_p}
//! $$
//!
//! Ex-ante annualized risk and return of a fixed allocation.

use ndarray::ArrayView1;

use super::stats::ReturnStatistics;
use super::types::sharpe_ratio;
use super::types::PortfolioPerformance;
use super::types::RiskFreeRate;
use super::types::TRADING_DAYS;
use crate::error::PortfolioError;
use crate::error::Result;

pub(crate) fn evaluate(
  weights: ArrayView1<'_, f64>,
  stats: &ReturnStatistics,
  risk_free: RiskFreeRate,
) -> PortfolioPerformance {
  let expected_return = stats.mean().dot(&weights) * TRADING_DAYS;
  let variance = weights.dot(&stats.covariance().dot(&weights));
  let volatility = (variance.max(0.0) * TRADING_DAYS).sqrt();

  PortfolioPerformance {
    expected_return,
    volatility,
    sharpe: sharpe_ratio(expected_return - risk_free.annualized(), volatility),
  }
}

/// Annualized return, volatility and Sharpe ratio of `weights`.
pub fn portfolio_performance(
  weights: &[f64],
  stats: &ReturnStatistics,
  risk_free: RiskFreeRate,
) -> Result<PortfolioPerformance> {
  if weights.len() != stats.n_assets() {
    return Err(PortfolioError::invalid(
      "weights",
      format!("expected {} weights, got {}", stats.n_assets(), weights.len()),
    ));
  }
  if weights.iter().any(|w| !w.is_finite()) {
    return Err(PortfolioError::invalid("weights", "non-finite weight"));
  }
  Ok(evaluate(ArrayView1::from(weights), stats, risk_free))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn two_assets() -> ReturnStatistics {
    ReturnStatistics::new(
      vec!["A".into(), "B".into()],
      array![0.001, 0.0005],
      array![[0.0004, 0.0001], [0.0001, 0.0001]],
    )
    .unwrap()
  }

  #[test]
  fn annualizes_return_and_volatility() {
    let rf = RiskFreeRate::from_daily(0.0001).unwrap();
    let perf = portfolio_performance(&[0.5, 0.5], &two_assets(), rf).unwrap();

    let var = 0.25 * 0.0004 + 2.0 * 0.25 * 0.0001 + 0.25 * 0.0001;
    let vol = (var * 252.0f64).sqrt();
    assert_abs_diff_eq!(perf.expected_return, 0.00075 * 252.0, epsilon = 1e-12);
    assert_abs_diff_eq!(perf.volatility, vol, epsilon = 1e-12);
    assert_abs_diff_eq!(perf.sharpe, (0.00075 * 252.0 - 0.0252) / vol, epsilon = 1e-12);
  }

  #[test]
  fn sharpe_subtracts_annualized_risk_free_rate() {
    // The daily rate is scaled by 252 before it meets the annualized return.
    let rf = RiskFreeRate::from_daily(0.0002).unwrap();
    let perf = portfolio_performance(&[1.0, 0.0], &two_assets(), rf).unwrap();
    let vol = (0.0004f64 * 252.0).sqrt();
    assert_abs_diff_eq!(perf.sharpe, (0.252 - 0.0504) / vol, epsilon = 1e-12);
    assert!((perf.sharpe - (0.252 - 0.0002) / vol).abs() > 0.1);
  }

  #[test]
  fn rejects_misaligned_weights() {
    let rf = RiskFreeRate::from_daily(0.0).unwrap();
    let err = portfolio_performance(&[1.0], &two_assets(), rf).unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidInput { .. }));
  }
}
