//! # portfolio-optimize
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}\ge 0,\ \mathbf 1^\top\mathbf{w}=1}
//! \frac{252\,\mathbf{w}^\top\mu - r_f}{\sqrt{252\,\mathbf{w}^\top\Sigma\mathbf{w}}}
//! $$
//!
//! Long-only maximum-Sharpe allocation from historical prices, with a
//! random-portfolio frontier sweep and a buy-and-hold backtest.
//!
//! ```ignore
//! let session = Session::create(&["AAPL", "MSFT", "GOOG"], 5, "mean-variance")?
//!   .fetch(&provider)?
//!   .estimate()?
//!   .optimize()?;
//! let report = session.backtest()?;
//! ```

pub mod config;
pub mod error;
pub mod portfolio;
pub mod provider;
pub mod session;
pub mod visualization;

pub use config::OptimizerMethod;
pub use config::SessionConfig;
pub use config::SolverConfig;
pub use error::PortfolioError;
pub use error::Result;
pub use provider::InMemoryProvider;
pub use provider::MarketDataProvider;
pub use session::Pipeline;
pub use session::Session;
