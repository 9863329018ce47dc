//! # Configuration
//!
//! Session and solver settings. Everything is validated when the session is
//! created so later stages can assume a well-formed universe.

use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::PortfolioError;
use crate::error::Result;

/// Default proxy for the short-term risk-free yield (13-week T-bill).
pub const DEFAULT_RISK_FREE_PROXY: &str = "^IRX";

/// Supported allocation methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptimizerMethod {
  /// Long-only maximum-Sharpe mean-variance allocation.
  #[default]
  MeanVariance,
}

impl FromStr for OptimizerMethod {
  type Err = PortfolioError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "mean-variance" | "mv" | "markowitz" => Ok(Self::MeanVariance),
      other => Err(PortfolioError::config(format!(
        "unsupported optimization method '{other}' (expected 'mean-variance')"
      ))),
    }
  }
}

impl Display for OptimizerMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      OptimizerMethod::MeanVariance => write!(f, "mean-variance"),
    }
  }
}

/// Settings for the projected-gradient solver.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
  /// Iteration budget before the run is reported as non-convergent.
  pub max_iters: u64,
  /// Converged once no weight moves by more than this in one step.
  pub tolerance: f64,
  /// First trial step length of the backtracking line search.
  pub initial_step: f64,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      max_iters: 10_000,
      tolerance: 1e-12,
      initial_step: 1.0,
    }
  }
}

impl SolverConfig {
  pub fn validate(&self) -> Result<()> {
    if self.max_iters == 0 {
      return Err(PortfolioError::config("solver max_iters must be positive"));
    }
    if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
      return Err(PortfolioError::config(format!(
        "solver tolerance must be positive, got {}",
        self.tolerance
      )));
    }
    if !(self.initial_step.is_finite() && self.initial_step > 0.0) {
      return Err(PortfolioError::config(format!(
        "solver initial_step must be positive, got {}",
        self.initial_step
      )));
    }
    Ok(())
  }
}

/// Immutable settings of one allocation session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
  tickers: Vec<String>,
  window_years: u32,
  method: OptimizerMethod,
  risk_free_proxy: String,
  solver: SolverConfig,
}

impl SessionConfig {
  /// Validate the asset universe, look-back window and method name.
  pub fn new<S: AsRef<str>>(tickers: &[S], window_years: u32, method: &str) -> Result<Self> {
    let tickers: Vec<String> = tickers
      .iter()
      .map(|t| t.as_ref().trim().to_string())
      .collect();

    if tickers.len() < 2 {
      return Err(PortfolioError::config(format!(
        "at least 2 assets are required, got {}",
        tickers.len()
      )));
    }
    if let Some(pos) = tickers.iter().position(|t| t.is_empty()) {
      return Err(PortfolioError::config(format!(
        "asset identifier at position {pos} is empty"
      )));
    }
    let mut seen = HashSet::with_capacity(tickers.len());
    for t in &tickers {
      if !seen.insert(t.as_str()) {
        return Err(PortfolioError::config(format!("duplicate asset identifier '{t}'")));
      }
    }
    if window_years == 0 {
      return Err(PortfolioError::config("window must be at least one year"));
    }

    Ok(Self {
      tickers,
      window_years,
      method: method.parse()?,
      risk_free_proxy: DEFAULT_RISK_FREE_PROXY.to_string(),
      solver: SolverConfig::default(),
    })
  }

  pub fn with_risk_free_proxy(mut self, proxy: &str) -> Self {
    self.risk_free_proxy = proxy.into();
    self
  }

  pub fn with_solver(mut self, solver: SolverConfig) -> Result<Self> {
    solver.validate()?;
    self.solver = solver;
    Ok(self)
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn window_years(&self) -> u32 {
    self.window_years
  }

  /// Trailing window in calendar days (365 per year).
  pub fn window_days(&self) -> i64 {
    365 * i64::from(self.window_years)
  }

  pub fn method(&self) -> OptimizerMethod {
    self.method
  }

  pub fn risk_free_proxy(&self) -> &str {
    &self.risk_free_proxy
  }

  pub fn solver(&self) -> &SolverConfig {
    &self.solver
  }
}
