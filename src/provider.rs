//! # Market Data Providers
//!
//! $$
//! (\text{assets}, t_0, t_1) \mapsto \{P_{i,t}\}_{t_0\le t\le t_1},\qquad
//! (\text{proxy}, t_0, t_1) \mapsto \{y_t\}
//! $$
//!
//! Sources of adjusted closes and risk-free proxy yields.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ndarray::Axis;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::portfolio::data::PriceHistory;

#[cfg(feature = "yahoo")]
pub mod yahoo;

/// Anything that can serve daily adjusted closes and a yield series.
pub trait MarketDataProvider {
  /// Adjusted closes for `assets` with `start <= date <= end`, columns in
  /// the requested order.
  fn fetch_prices(
    &self,
    assets: &[String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PriceHistory>;

  /// Annual percentage yields of `proxy` (e.g. `4.5` for 4.5%).
  fn fetch_risk_free_series(
    &self,
    proxy: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<f64>>;
}

/// Offline provider backed by a stored price table.
#[derive(Clone, Debug)]
pub struct InMemoryProvider {
  prices: PriceHistory,
  yields: BTreeMap<String, Vec<(NaiveDate, f64)>>,
}

impl InMemoryProvider {
  pub fn new(prices: PriceHistory) -> Self {
    Self {
      prices,
      yields: BTreeMap::new(),
    }
  }

  /// Register a dated yield series for `proxy`.
  pub fn with_risk_free_series(
    mut self,
    proxy: impl Into<String>,
    mut observations: Vec<(NaiveDate, f64)>,
  ) -> Self {
    observations.sort_by_key(|(d, _)| *d);
    self.yields.insert(proxy.into(), observations);
    self
  }
}

impl MarketDataProvider for InMemoryProvider {
  fn fetch_prices(
    &self,
    assets: &[String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PriceHistory> {
    let history = self.prices.select(assets)?.between(start, end);
    if history.is_empty() {
      return Err(PortfolioError::data(
        assets.join(","),
        format!("no prices between {start} and {end}"),
      ));
    }
    for (asset, column) in history.assets().iter().zip(history.prices().axis_iter(Axis(1))) {
      if column.iter().all(|p| p.is_nan()) {
        return Err(PortfolioError::data(
          asset.as_str(),
          format!("no observations between {start} and {end}"),
        ));
      }
    }
    Ok(history)
  }

  fn fetch_risk_free_series(
    &self,
    proxy: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<f64>> {
    let series = self
      .yields
      .get(proxy)
      .ok_or_else(|| PortfolioError::data(proxy, "unknown risk-free proxy"))?;
    let window: Vec<f64> = series
      .iter()
      .filter(|(d, _)| *d >= start && *d <= end)
      .map(|(_, y)| *y)
      .collect();
    if window.is_empty() {
      return Err(PortfolioError::data(
        proxy,
        format!("no yields between {start} and {end}"),
      ));
    }
    Ok(window)
  }
}
