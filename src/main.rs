use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressIterator;
use portfolio_optimize::config::DEFAULT_RISK_FREE_PROXY;
use portfolio_optimize::portfolio::types::FrontierPoint;
use portfolio_optimize::provider::yahoo::YahooProvider;
use portfolio_optimize::visualization::cumulative_returns_chart;
use portfolio_optimize::visualization::frontier_chart;
use portfolio_optimize::Session;
use portfolio_optimize::SessionConfig;
use prettytable::row;
use prettytable::Table;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Maximum-Sharpe allocation over a trailing window of Yahoo Finance data.
#[derive(Parser, Debug)]
#[command(name = "portfolio-optimize", version)]
struct Cli {
  /// Comma-separated tickers, e.g. AAPL,MSFT,GOOG
  #[arg(long, value_delimiter = ',', required = true)]
  tickers: Vec<String>,

  /// Look-back window in years
  #[arg(long, default_value_t = 5)]
  window: u32,

  /// Optimization method
  #[arg(long, default_value = "mean-variance")]
  method: String,

  /// Random portfolios in the frontier sweep
  #[arg(long, default_value_t = 5000)]
  samples: usize,

  /// Seed for a reproducible sweep
  #[arg(long)]
  seed: Option<u64>,

  /// Yield index used as the risk-free proxy
  #[arg(long, default_value = DEFAULT_RISK_FREE_PROXY)]
  risk_free_proxy: String,

  /// Write the frontier chart here instead of opening a browser
  #[arg(long)]
  frontier_html: Option<PathBuf>,

  /// Write the backtest chart here instead of opening a browser
  #[arg(long)]
  backtest_html: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();
  let config = SessionConfig::new(cli.tickers.as_slice(), cli.window, &cli.method)?
    .with_risk_free_proxy(&cli.risk_free_proxy);
  let provider = YahooProvider::new()?;

  let optimized = Session::from_config(config)
    .fetch(&provider)
    .context("fetching market data")?
    .estimate()?
    .optimize()?;

  let mut weights = Table::new();
  weights.add_row(row!["Asset", "Weight"]);
  for (asset, w) in optimized.statistics().assets().iter().zip(optimized.weights().iter()) {
    weights.add_row(row![asset, format!("{:.2}%", w * 100.0)]);
  }
  weights.printstd();

  let best = optimized.optimal_performance();
  let mut model = Table::new();
  model.add_row(row!["Expected return", "Volatility", "Sharpe"]);
  model.add_row(row![
    format!("{:.2}%", best.expected_return * 100.0),
    format!("{:.2}%", best.volatility * 100.0),
    format!("{:.3}", best.sharpe)
  ]);
  model.printstd();

  let rng = match cli.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };
  let points: Vec<FrontierPoint> = optimized
    .frontier_sweep(cli.samples, rng)
    .progress()
    .collect();
  let frontier = frontier_chart(&points, Some(&best));
  match &cli.frontier_html {
    Some(path) => frontier.write_html(path),
    None => frontier.show(),
  }

  let ready = optimized.backtest()?;
  let s = ready.report().summary;
  let mut summary = Table::new();
  summary.add_row(row!["Total return", "Annualized return", "Annualized volatility", "Sharpe"]);
  summary.add_row(row![
    format!("{:.2}%", s.total_return * 100.0),
    format!("{:.2}%", s.annualized_return * 100.0),
    format!("{:.2}%", s.annualized_volatility * 100.0),
    format!("{:.3}", s.sharpe_ratio)
  ]);
  summary.printstd();

  let chart = cumulative_returns_chart(ready.report());
  match &cli.backtest_html {
    Some(path) => chart.write_html(path),
    None => chart.show(),
  }

  info!(samples = points.len(), "done");
  Ok(())
}
