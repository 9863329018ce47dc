//! # Session
//!
//! $$
//! \text{Created}\to\text{DataFetched}\to\text{StatisticsComputed}\to\text{Optimized}\to\text{BacktestReady}
//! $$
//!
//! One allocation run as a typed state machine. Every stage borrows the
//! previous session and returns a new one; stages share immutable data
//! through `Arc`, so earlier sessions stay usable.

use std::sync::Arc;

use chrono::Local;
use chrono::NaiveDate;
use chrono::TimeDelta;
use rand::Rng;
use tracing::info;

use crate::config::OptimizerMethod;
use crate::config::SessionConfig;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::portfolio::backtest::backtest;
use crate::portfolio::data::PriceHistory;
use crate::portfolio::data::ReturnSeries;
use crate::portfolio::frontier::FrontierSweep;
use crate::portfolio::optimizers::optimize_max_sharpe;
use crate::portfolio::performance::portfolio_performance;
use crate::portfolio::stats::ReturnStatistics;
use crate::portfolio::types::BacktestReport;
use crate::portfolio::types::PortfolioPerformance;
use crate::portfolio::types::RiskFreeRate;
use crate::portfolio::types::WeightVector;
use crate::provider::MarketDataProvider;

/// Nothing fetched yet.
#[derive(Clone, Copy, Debug)]
pub struct Created;

/// Prices and the risk-free rate are loaded.
#[derive(Clone, Debug)]
pub struct DataFetched {
  prices: Arc<PriceHistory>,
  risk_free: RiskFreeRate,
}

/// Returns and their moments are estimated.
#[derive(Clone, Debug)]
pub struct StatisticsComputed {
  data: DataFetched,
  returns: Arc<ReturnSeries>,
  statistics: Arc<ReturnStatistics>,
}

/// A maximum-Sharpe allocation exists.
#[derive(Clone, Debug)]
pub struct Optimized {
  analysis: StatisticsComputed,
  weights: Arc<WeightVector>,
  performance: PortfolioPerformance,
}

/// The allocation has been replayed over the return history.
#[derive(Clone, Debug)]
pub struct BacktestReady {
  optimized: Optimized,
  report: Arc<BacktestReport>,
}

/// States that carry estimated return statistics.
pub trait Estimated {
  fn analysis(&self) -> &StatisticsComputed;
}

impl Estimated for StatisticsComputed {
  fn analysis(&self) -> &StatisticsComputed {
    self
  }
}

impl Estimated for Optimized {
  fn analysis(&self) -> &StatisticsComputed {
    &self.analysis
  }
}

impl Estimated for BacktestReady {
  fn analysis(&self) -> &StatisticsComputed {
    &self.optimized.analysis
  }
}

/// Allocation session in state `S`.
#[derive(Clone, Debug)]
pub struct Session<S> {
  config: Arc<SessionConfig>,
  state: S,
}

impl<S> Session<S> {
  pub fn config(&self) -> &SessionConfig {
    &self.config
  }

  fn advance<T>(&self, state: T) -> Session<T> {
    Session {
      config: Arc::clone(&self.config),
      state,
    }
  }
}

impl Session<Created> {
  /// Validate the universe, window and method.
  pub fn create<S: AsRef<str>>(tickers: &[S], window_years: u32, method: &str) -> Result<Self> {
    Ok(Self::from_config(SessionConfig::new(
      tickers,
      window_years,
      method,
    )?))
  }

  pub fn from_config(config: SessionConfig) -> Self {
    Self {
      config: Arc::new(config),
      state: Created,
    }
  }

  /// Fetch the trailing window ending today.
  pub fn fetch<P: MarketDataProvider + ?Sized>(&self, provider: &P) -> Result<Session<DataFetched>> {
    self.fetch_as_of(provider, Local::now().date_naive())
  }

  /// Fetch the trailing window ending at `end`.
  pub fn fetch_as_of<P: MarketDataProvider + ?Sized>(
    &self,
    provider: &P,
    end: NaiveDate,
  ) -> Result<Session<DataFetched>> {
    let start = TimeDelta::try_days(self.config.window_days())
      .and_then(|span| end.checked_sub_signed(span))
      .ok_or_else(|| {
        PortfolioError::config(format!(
          "a {}-year window before {end} is out of range",
          self.config.window_years()
        ))
      })?;

    let prices = provider.fetch_prices(self.config.tickers(), start, end)?;
    let proxy = self.config.risk_free_proxy();
    let yields = provider.fetch_risk_free_series(proxy, start, end)?;
    let risk_free = RiskFreeRate::from_annual_percent_yields(proxy, &yields)?;

    info!(
      assets = ?self.config.tickers(),
      %start,
      %end,
      rows = prices.n_rows(),
      risk_free_daily = risk_free.daily(),
      "fetched market data"
    );
    Ok(self.advance(DataFetched {
      prices: Arc::new(prices),
      risk_free,
    }))
  }
}

impl Session<DataFetched> {
  pub fn prices(&self) -> &PriceHistory {
    &self.state.prices
  }

  pub fn risk_free(&self) -> RiskFreeRate {
    self.state.risk_free
  }

  /// Derive the return series and its sample moments.
  pub fn estimate(&self) -> Result<Session<StatisticsComputed>> {
    let returns = ReturnSeries::from_prices(&self.state.prices)?;
    let statistics = ReturnStatistics::from_returns(&returns)?;
    info!(
      periods = returns.n_periods(),
      assets = statistics.n_assets(),
      "estimated return statistics"
    );
    Ok(self.advance(StatisticsComputed {
      data: self.state.clone(),
      returns: Arc::new(returns),
      statistics: Arc::new(statistics),
    }))
  }
}

impl<S: Estimated> Session<S> {
  pub fn prices(&self) -> &PriceHistory {
    &self.state.analysis().data.prices
  }

  pub fn risk_free(&self) -> RiskFreeRate {
    self.state.analysis().data.risk_free
  }

  pub fn statistics(&self) -> &ReturnStatistics {
    &self.state.analysis().statistics
  }

  pub fn returns(&self) -> &ReturnSeries {
    &self.state.analysis().returns
  }

  /// Solve for the allocation with the session's method. Re-running on an
  /// optimized session yields a fresh session with identical weights.
  pub fn optimize(&self) -> Result<Session<Optimized>> {
    let analysis = self.state.analysis();
    let weights = match self.config.method() {
      OptimizerMethod::MeanVariance => optimize_max_sharpe(
        &analysis.statistics,
        analysis.data.risk_free,
        self.config.solver(),
      )?,
    };
    let performance = portfolio_performance(&weights, &analysis.statistics, analysis.data.risk_free)?;
    info!(
      method = %self.config.method(),
      weights = ?weights.as_slice(),
      expected_return = performance.expected_return,
      volatility = performance.volatility,
      sharpe = performance.sharpe,
      "optimized allocation"
    );
    Ok(self.advance(Optimized {
      analysis: analysis.clone(),
      weights: Arc::new(weights),
      performance,
    }))
  }

  /// Random long-only portfolios for a frontier scatter.
  pub fn frontier_sweep<R: Rng>(&self, samples: usize, rng: R) -> FrontierSweep<'_, R> {
    info!(samples, "starting frontier sweep");
    FrontierSweep::new(self.statistics(), self.risk_free(), samples, rng)
  }

  /// Ex-ante performance of arbitrary `weights` under this session's estimates.
  pub fn performance(&self, weights: &[f64]) -> Result<PortfolioPerformance> {
    portfolio_performance(weights, self.statistics(), self.risk_free())
  }
}

impl Session<Optimized> {
  pub fn weights(&self) -> &WeightVector {
    &self.state.weights
  }

  /// Ex-ante performance of the optimal allocation.
  pub fn optimal_performance(&self) -> PortfolioPerformance {
    self.state.performance
  }

  /// Replay the optimal allocation over the estimation window.
  pub fn backtest(&self) -> Result<Session<BacktestReady>> {
    let report = backtest(
      &self.state.weights,
      &self.state.analysis.returns,
      self.state.analysis.data.risk_free,
    )?;
    info!(
      total_return = report.summary.total_return,
      annualized_return = report.summary.annualized_return,
      annualized_volatility = report.summary.annualized_volatility,
      sharpe = report.summary.sharpe_ratio,
      "backtest complete"
    );
    Ok(self.advance(BacktestReady {
      optimized: self.state.clone(),
      report: Arc::new(report),
    }))
  }
}

impl Session<BacktestReady> {
  pub fn weights(&self) -> &WeightVector {
    &self.state.optimized.weights
  }

  pub fn optimal_performance(&self) -> PortfolioPerformance {
    self.state.optimized.performance
  }

  pub fn report(&self) -> &BacktestReport {
    &self.state.report
  }
}

/// Runtime wrapper over the typed session for callers that drive stages
/// by name. Out-of-order requests fail with
/// [`PortfolioError::Precondition`] and leave the pipeline untouched.
#[derive(Clone, Debug)]
pub enum Pipeline {
  Created(Session<Created>),
  DataFetched(Session<DataFetched>),
  StatisticsComputed(Session<StatisticsComputed>),
  Optimized(Session<Optimized>),
  BacktestReady(Session<BacktestReady>),
}

impl Pipeline {
  pub fn new(config: SessionConfig) -> Self {
    Self::Created(Session::from_config(config))
  }

  pub fn stage(&self) -> &'static str {
    match self {
      Self::Created(_) => "created",
      Self::DataFetched(_) => "data fetched",
      Self::StatisticsComputed(_) => "statistics computed",
      Self::Optimized(_) => "optimized",
      Self::BacktestReady(_) => "backtest ready",
    }
  }

  pub fn config(&self) -> &SessionConfig {
    match self {
      Self::Created(s) => s.config(),
      Self::DataFetched(s) => s.config(),
      Self::StatisticsComputed(s) => s.config(),
      Self::Optimized(s) => s.config(),
      Self::BacktestReady(s) => s.config(),
    }
  }

  fn created(&self) -> Session<Created> {
    let config = match self {
      Self::Created(s) => &s.config,
      Self::DataFetched(s) => &s.config,
      Self::StatisticsComputed(s) => &s.config,
      Self::Optimized(s) => &s.config,
      Self::BacktestReady(s) => &s.config,
    };
    Session {
      config: Arc::clone(config),
      state: Created,
    }
  }

  fn fetched(&self) -> Option<Session<DataFetched>> {
    match self {
      Self::Created(_) => None,
      Self::DataFetched(s) => Some(s.clone()),
      Self::StatisticsComputed(s) => Some(s.advance(s.state.data.clone())),
      Self::Optimized(s) => Some(s.advance(s.state.analysis.data.clone())),
      Self::BacktestReady(s) => Some(s.advance(s.state.optimized.analysis.data.clone())),
    }
  }

  fn analysis(&self) -> Option<(&StatisticsComputed, &Arc<SessionConfig>)> {
    match self {
      Self::Created(_) | Self::DataFetched(_) => None,
      Self::StatisticsComputed(s) => Some((s.state.analysis(), &s.config)),
      Self::Optimized(s) => Some((s.state.analysis(), &s.config)),
      Self::BacktestReady(s) => Some((s.state.analysis(), &s.config)),
    }
  }

  fn estimated(&self, operation: &'static str) -> Result<Session<StatisticsComputed>> {
    let (analysis, config) = self.analysis().ok_or(PortfolioError::Precondition {
      operation,
      required: "estimate",
    })?;
    Ok(Session {
      config: Arc::clone(config),
      state: analysis.clone(),
    })
  }

  /// (Re)load market data; allowed from any stage.
  pub fn fetch_as_of<P: MarketDataProvider + ?Sized>(
    &mut self,
    provider: &P,
    end: NaiveDate,
  ) -> Result<()> {
    let next = self.created().fetch_as_of(provider, end)?;
    *self = Self::DataFetched(next);
    Ok(())
  }

  pub fn fetch<P: MarketDataProvider + ?Sized>(&mut self, provider: &P) -> Result<()> {
    self.fetch_as_of(provider, Local::now().date_naive())
  }

  pub fn estimate(&mut self) -> Result<()> {
    let data = self.fetched().ok_or(PortfolioError::Precondition {
      operation: "estimate",
      required: "fetch",
    })?;
    *self = Self::StatisticsComputed(data.estimate()?);
    Ok(())
  }

  pub fn optimize(&mut self) -> Result<&WeightVector> {
    let next = self.estimated("optimize")?.optimize()?;
    *self = Self::Optimized(next);
    self.weights().ok_or(PortfolioError::Precondition {
      operation: "weights",
      required: "optimize",
    })
  }

  pub fn backtest(&mut self) -> Result<&BacktestReport> {
    let next = match self {
      Self::Optimized(s) => s.backtest()?,
      Self::BacktestReady(s) => s.advance(s.state.optimized.clone()).backtest()?,
      _ => {
        return Err(PortfolioError::Precondition {
          operation: "backtest",
          required: "optimize",
        });
      }
    };
    *self = Self::BacktestReady(next);
    self.report().ok_or(PortfolioError::Precondition {
      operation: "report",
      required: "backtest",
    })
  }

  pub fn frontier_sweep<R: Rng>(&self, samples: usize, rng: R) -> Result<FrontierSweep<'_, R>> {
    let (analysis, _) = self.analysis().ok_or(PortfolioError::Precondition {
      operation: "frontier sweep",
      required: "estimate",
    })?;
    info!(samples, "starting frontier sweep");
    Ok(FrontierSweep::new(
      &analysis.statistics,
      analysis.data.risk_free,
      samples,
      rng,
    ))
  }

  pub fn performance(&self, weights: &[f64]) -> Result<PortfolioPerformance> {
    let (analysis, _) = self.analysis().ok_or(PortfolioError::Precondition {
      operation: "performance",
      required: "estimate",
    })?;
    portfolio_performance(weights, &analysis.statistics, analysis.data.risk_free)
  }

  pub fn weights(&self) -> Option<&WeightVector> {
    match self {
      Self::Optimized(s) => Some(s.weights()),
      Self::BacktestReady(s) => Some(s.weights()),
      _ => None,
    }
  }

  pub fn report(&self) -> Option<&BacktestReport> {
    match self {
      Self::BacktestReady(s) => Some(s.report()),
      _ => None,
    }
  }
}
