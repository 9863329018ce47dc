//! # Portfolio Optimizers
//!
//! $$
//! \min_{\mathbf{w}\in\Delta}\ -\frac{252\,\mathbf{w}^\top\mu - r_f}{\sqrt{252}\,\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Long-only maximum-Sharpe allocation solved with projected gradient descent.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::Gradient;
use argmin::core::State;
use argmin::core::TerminationReason;
use argmin::core::TerminationStatus;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use super::solver::ProjectedGradient;
use super::stats::ReturnStatistics;
use super::types::RiskFreeRate;
use super::types::WeightVector;
use super::types::TRADING_DAYS;
use super::types::WEIGHT_SUM_TOLERANCE;
use crate::config::SolverConfig;
use crate::error::PortfolioError;
use crate::error::Result;

/// Negative annualized Sharpe ratio of a weight vector.
#[derive(Clone, Debug)]
pub struct NegativeSharpe {
  mu: Array1<f64>,
  cov: Array2<f64>,
  rf_annual: f64,
}

impl NegativeSharpe {
  pub fn new(stats: &ReturnStatistics, risk_free: RiskFreeRate) -> Self {
    Self {
      mu: stats.mean().clone(),
      cov: stats.covariance().clone(),
      rf_annual: risk_free.annualized(),
    }
  }

  /// Annualized return, annualized volatility and `Sigma w`.
  fn moments(&self, w: &[f64]) -> (f64, f64, Array1<f64>) {
    let w = Array1::from(w.to_vec());
    let sigma_w = self.cov.dot(&w);
    let ann_ret = self.mu.dot(&w) * TRADING_DAYS;
    let ann_vol = (w.dot(&sigma_w).max(0.0) * TRADING_DAYS).sqrt();
    (ann_ret, ann_vol, sigma_w)
  }
}

impl CostFunction for NegativeSharpe {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, w: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let (ann_ret, ann_vol, _) = self.moments(w);
    if ann_vol <= 1e-15 {
      anyhow::bail!("portfolio volatility is zero at {w:?}");
    }
    Ok(-(ann_ret - self.rf_annual) / ann_vol)
  }
}

impl Gradient for NegativeSharpe {
  type Param = Vec<f64>;
  type Gradient = Vec<f64>;

  fn gradient(&self, w: &Self::Param) -> std::result::Result<Self::Gradient, argmin::core::Error> {
    let (ann_ret, ann_vol, sigma_w) = self.moments(w);
    if ann_vol <= 1e-15 {
      anyhow::bail!("portfolio volatility is zero at {w:?}");
    }
    let excess = ann_ret - self.rf_annual;
    let vol3 = ann_vol.powi(3);
    // d/dw of -(R - rf) / V with dR = 252 mu, dV = 252 Sigma w / V.
    Ok(
      self
        .mu
        .iter()
        .zip(sigma_w.iter())
        .map(|(m, sw)| -(TRADING_DAYS * m / ann_vol - excess * TRADING_DAYS * sw / vol3))
        .collect(),
    )
  }
}

/// Maximize the annualized Sharpe ratio over long-only, fully invested weights.
///
/// Starts from the uniform allocation. Fails with
/// [`PortfolioError::Convergence`] rather than returning the starting point
/// when the solver cannot certify an optimum.
pub fn optimize_max_sharpe(
  stats: &ReturnStatistics,
  risk_free: RiskFreeRate,
  solver: &SolverConfig,
) -> Result<WeightVector> {
  solver.validate()?;
  let n = stats.n_assets();
  let x0 = WeightVector::uniform(n)?.into_inner();

  let problem = NegativeSharpe::new(stats, risk_free);
  let res = Executor::new(
    problem,
    ProjectedGradient::new(solver.initial_step, solver.tolerance),
  )
  .configure(|state| state.param(x0).max_iters(solver.max_iters))
  .ctrlc(false)
  .run()
  .map_err(|e| PortfolioError::Convergence {
    iterations: 0,
    reason: e.to_string(),
  })?;

  let state = res.state();
  let iterations = state.get_iter();
  match state.get_termination_status() {
    TerminationStatus::Terminated(TerminationReason::SolverConverged) => {}
    other => {
      return Err(PortfolioError::Convergence {
        iterations,
        reason: other.to_string(),
      });
    }
  }

  let best = state
    .get_best_param()
    .cloned()
    .ok_or_else(|| PortfolioError::Convergence {
      iterations,
      reason: "solver produced no allocation".into(),
    })?;

  let total: f64 = best.iter().sum();
  if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE || best.iter().any(|w| !(0.0..=1.0).contains(w)) {
    return Err(PortfolioError::Convergence {
      iterations,
      reason: format!("infeasible allocation {best:?}"),
    });
  }

  debug!(iterations, sharpe = -state.get_best_cost(), "max-sharpe solve converged");
  WeightVector::new(best)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn stats(mu: Array1<f64>, cov: Array2<f64>) -> ReturnStatistics {
    let assets = (0..mu.len()).map(|i| format!("A{i}")).collect();
    ReturnStatistics::new(assets, mu, cov).unwrap()
  }

  fn assert_feasible(w: &[f64]) {
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = WEIGHT_SUM_TOLERANCE);
    assert!(w.iter().all(|x| (0.0..=1.0).contains(x)));
  }

  #[test]
  fn diagonal_case_matches_closed_form_tangency() {
    let mu = array![0.001, 0.0008, 0.0012];
    let var = [0.0004, 0.0003, 0.0005];
    let cov = Array2::from_diag(&Array1::from(var.to_vec()));
    let rf = RiskFreeRate::from_daily(0.00005).unwrap();

    let w = optimize_max_sharpe(&stats(mu.clone(), cov), rf, &SolverConfig::default()).unwrap();
    assert_feasible(&w);

    // Interior tangency portfolio: w ∝ Σ⁻¹(μ − rf).
    let raw: Vec<f64> = (0..3).map(|i| (mu[i] - rf.daily()) / var[i]).collect();
    let total: f64 = raw.iter().sum();
    for i in 0..3 {
      assert_abs_diff_eq!(w[i], raw[i] / total, epsilon = 1e-5);
    }

    // Asset 3 has the best standalone Sharpe, asset 2 the best excess-return-to-variance ratio.
    let largest = (0..3).max_by(|&a, &b| w[a].total_cmp(&w[b])).unwrap();
    assert_eq!(largest, 1);
  }

  #[test]
  fn identical_assets_get_equal_weights() {
    let mu = array![0.0005, 0.0005, 0.0005, 0.0005];
    let cov = array![
      [0.0004, 0.0001, 0.0001, 0.0001],
      [0.0001, 0.0004, 0.0001, 0.0001],
      [0.0001, 0.0001, 0.0004, 0.0001],
      [0.0001, 0.0001, 0.0001, 0.0004]
    ];
    let rf = RiskFreeRate::from_daily(0.0001).unwrap();

    let w = optimize_max_sharpe(&stats(mu, cov), rf, &SolverConfig::default()).unwrap();
    for x in w.iter() {
      assert_abs_diff_eq!(*x, 0.25, epsilon = 1e-9);
    }
  }

  #[test]
  fn dominated_asset_is_dropped() {
    // Asset 2 has a negative excess return and no diversification benefit.
    let mu = array![0.0010, 0.0009, -0.0005];
    let cov = array![
      [0.0002, 0.00005, 0.0],
      [0.00005, 0.0002, 0.0],
      [0.0, 0.0, 0.0002]
    ];
    let rf = RiskFreeRate::from_daily(0.0).unwrap();

    let w = optimize_max_sharpe(&stats(mu, cov), rf, &SolverConfig::default()).unwrap();
    assert_feasible(&w);
    assert_eq!(w[2], 0.0);
    assert!(w[0] > w[1]);
  }

  #[test]
  fn repeated_solves_are_identical() {
    let mu = array![0.0007, 0.0011, 0.0004];
    let cov = array![
      [0.00030, 0.00008, 0.00002],
      [0.00008, 0.00050, 0.00004],
      [0.00002, 0.00004, 0.00020]
    ];
    let s = stats(mu, cov);
    let rf = RiskFreeRate::from_daily(0.00008).unwrap();

    let a = optimize_max_sharpe(&s, rf, &SolverConfig::default()).unwrap();
    let b = optimize_max_sharpe(&s, rf, &SolverConfig::default()).unwrap();
    assert_eq!(a, b);
    assert_feasible(&a);
  }

  #[test]
  fn exhausted_budget_is_a_convergence_error() {
    let mu = array![0.001, 0.0008, 0.0012];
    let cov = Array2::from_diag(&array![0.0004, 0.0003, 0.0005]);
    let solver = SolverConfig {
      max_iters: 1,
      tolerance: 1e-15,
      initial_step: 1e-6,
    };

    let err = optimize_max_sharpe(
      &stats(mu, cov),
      RiskFreeRate::from_daily(0.0).unwrap(),
      &solver,
    )
    .unwrap_err();
    assert!(matches!(err, PortfolioError::Convergence { iterations: 1, .. }));
  }

  #[test]
  fn zero_variance_universe_cannot_be_optimized() {
    let mu = array![0.001, 0.001];
    let cov = Array2::zeros((2, 2));
    let err = optimize_max_sharpe(
      &stats(mu, cov),
      RiskFreeRate::from_daily(0.0).unwrap(),
      &SolverConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PortfolioError::Convergence { .. }));
  }

  #[test]
  fn gradient_matches_finite_differences() {
    let mu = array![0.0007, 0.0011, 0.0004];
    let cov = array![
      [0.00030, 0.00008, 0.00002],
      [0.00008, 0.00050, 0.00004],
      [0.00002, 0.00004, 0.00020]
    ];
    let f = NegativeSharpe::new(&stats(mu, cov), RiskFreeRate::from_daily(0.0001).unwrap());
    let w = vec![0.2, 0.5, 0.3];
    let g = f.gradient(&w).unwrap();
    let h = 1e-7;
    for i in 0..3 {
      let mut up = w.clone();
      let mut down = w.clone();
      up[i] += h;
      down[i] -= h;
      let fd = (f.cost(&up).unwrap() - f.cost(&down).unwrap()) / (2.0 * h);
      assert_abs_diff_eq!(g[i], fd, epsilon = 1e-5);
    }
  }
}
