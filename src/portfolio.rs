//! # Portfolio
//!
//! $$
//! S_p = \frac{252\,\mathbf{w}^\top\mu - r_f}{\sqrt{252\,\mathbf{w}^\top \Sigma \mathbf{w}}}
//! $$
//!
//! Return estimation, maximum-Sharpe allocation, frontier sampling and backtesting.

pub mod backtest;
pub mod data;
pub mod frontier;
pub mod optimizers;
pub mod performance;
pub mod solver;
pub mod stats;
pub mod types;

pub use backtest::backtest;
pub use data::PriceHistory;
pub use data::ReturnSeries;
pub use frontier::FrontierSweep;
pub use frontier::sweep;
pub use optimizers::NegativeSharpe;
pub use optimizers::optimize_max_sharpe;
pub use performance::portfolio_performance;
pub use solver::ProjectedGradient;
pub use solver::project_simplex;
pub use stats::ReturnStatistics;
pub use stats::estimate;
pub use types::BacktestReport;
pub use types::FrontierPoint;
pub use types::PerformanceSummary;
pub use types::PortfolioPerformance;
pub use types::RiskFreeRate;
pub use types::TRADING_DAYS;
pub use types::WEIGHT_SUM_TOLERANCE;
pub use types::WeightVector;
