//! # Portfolio Data
//!
//! $$
//! r_{i,t} = \frac{P_{i,t}}{P_{i,t-1}} - 1
//! $$
//!
//! Price tables and the simple-return series derived from them.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

use crate::error::PortfolioError;
use crate::error::Result;

/// Adjusted closing prices, one row per date and one column per asset.
///
/// Missing observations are `NaN`.
#[derive(Clone, Debug)]
pub struct PriceHistory {
  dates: Vec<NaiveDate>,
  assets: Vec<String>,
  prices: Array2<f64>,
}

impl PriceHistory {
  /// Build from a dense `dates x assets` matrix.
  pub fn new(dates: Vec<NaiveDate>, assets: Vec<String>, prices: Array2<f64>) -> Result<Self> {
    if prices.nrows() != dates.len() || prices.ncols() != assets.len() {
      return Err(PortfolioError::invalid(
        "prices",
        format!(
          "matrix is {}x{} but index has {} dates and {} assets",
          prices.nrows(),
          prices.ncols(),
          dates.len(),
          assets.len()
        ),
      ));
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
      return Err(PortfolioError::invalid(
        "dates",
        "must be strictly ascending",
      ));
    }
    Ok(Self {
      dates,
      assets,
      prices,
    })
  }

  /// Outer-join per-asset `(date, price)` series on date.
  ///
  /// Dates an asset has no observation for are filled with `NaN`.
  pub fn from_series(series: Vec<(String, Vec<(NaiveDate, f64)>)>) -> Result<Self> {
    let dates: Vec<NaiveDate> = series
      .iter()
      .flat_map(|(_, obs)| obs.iter().map(|(d, _)| *d))
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();
    let row_of: BTreeMap<NaiveDate, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut prices = Array2::from_elem((dates.len(), series.len()), f64::NAN);
    let mut assets = Vec::with_capacity(series.len());
    for (col, (asset, obs)) in series.into_iter().enumerate() {
      for (date, price) in obs {
        prices[[row_of[&date], col]] = price;
      }
      assets.push(asset);
    }

    Self::new(dates, assets, prices)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  pub fn n_rows(&self) -> usize {
    self.dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }

  /// Prices of one asset, if it is part of the table.
  pub fn column(&self, asset: &str) -> Option<ArrayView1<'_, f64>> {
    self
      .assets
      .iter()
      .position(|a| a == asset)
      .map(|i| self.prices.column(i))
  }

  /// Rows with `start <= date <= end`.
  pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let rows: Vec<usize> = self
      .dates
      .iter()
      .enumerate()
      .filter(|(_, d)| **d >= start && **d <= end)
      .map(|(i, _)| i)
      .collect();
    Self {
      dates: rows.iter().map(|&i| self.dates[i]).collect(),
      assets: self.assets.clone(),
      prices: self.prices.select(Axis(0), &rows),
    }
  }

  /// Columns for `assets`, in that order.
  pub fn select(&self, assets: &[String]) -> Result<Self> {
    let mut cols = Vec::with_capacity(assets.len());
    for asset in assets {
      let col = self
        .assets
        .iter()
        .position(|a| a == asset)
        .ok_or_else(|| PortfolioError::data(asset.as_str(), "unknown asset identifier"))?;
      cols.push(col);
    }
    Ok(Self {
      dates: self.dates.clone(),
      assets: assets.to_vec(),
      prices: self.prices.select(Axis(1), &cols),
    })
  }
}

/// Simple returns between consecutive complete price rows.
#[derive(Clone, Debug)]
pub struct ReturnSeries {
  dates: Vec<NaiveDate>,
  assets: Vec<String>,
  values: Array2<f64>,
}

impl ReturnSeries {
  /// Derive returns, dropping any date on which some asset has no price.
  pub fn from_prices(prices: &PriceHistory) -> Result<Self> {
    if prices.assets.len() < 2 {
      return Err(PortfolioError::config(format!(
        "covariance needs at least 2 assets, got {}",
        prices.assets.len()
      )));
    }

    let mut complete = Vec::with_capacity(prices.n_rows());
    for (t, row) in prices.prices.outer_iter().enumerate() {
      if row.iter().any(|p| p.is_nan()) {
        continue;
      }
      for (i, &p) in row.iter().enumerate() {
        if !(p.is_finite() && p > 0.0) {
          return Err(PortfolioError::data(
            prices.assets[i].as_str(),
            format!("invalid price {p} on {}", prices.dates[t]),
          ));
        }
      }
      complete.push(t);
    }

    let dropped = prices.n_rows() - complete.len();
    if dropped > 0 {
      tracing::debug!(dropped, "dropped dates with incomplete prices");
    }

    let n_returns = complete.len().saturating_sub(1);
    if n_returns < 2 {
      return Err(PortfolioError::data(
        prices.assets.join(","),
        format!("{n_returns} usable return rows, at least 2 are required"),
      ));
    }

    let mut values = Array2::zeros((n_returns, prices.assets.len()));
    let mut dates = Vec::with_capacity(n_returns);
    for (k, pair) in complete.windows(2).enumerate() {
      let prev = prices.prices.row(pair[0]);
      let curr = prices.prices.row(pair[1]);
      for i in 0..prices.assets.len() {
        values[[k, i]] = curr[i] / prev[i] - 1.0;
      }
      dates.push(prices.dates[pair[1]]);
    }

    Ok(Self {
      dates,
      assets: prices.assets.clone(),
      values,
    })
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  /// `periods x assets` matrix of simple returns.
  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn n_periods(&self) -> usize {
    self.values.nrows()
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  fn names(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn returns_are_simple_fractional_changes() {
    let prices = PriceHistory::new(
      vec![day(2), day(3), day(4)],
      names(&["A", "B"]),
      array![[100.0, 50.0], [110.0, 45.0], [99.0, 54.0]],
    )
    .unwrap();

    let rets = ReturnSeries::from_prices(&prices).unwrap();
    assert_eq!(rets.dates(), &[day(3), day(4)]);
    assert_abs_diff_eq!(rets.values()[[0, 0]], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(rets.values()[[0, 1]], -0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(rets.values()[[1, 0]], -0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(rets.values()[[1, 1]], 0.2, epsilon = 1e-12);
  }

  #[test]
  fn incomplete_dates_are_dropped_for_every_asset() {
    let prices = PriceHistory::from_series(vec![
      (
        "A".into(),
        vec![(day(2), 100.0), (day(3), 101.0), (day(4), 102.0), (day(5), 103.0)],
      ),
      ("B".into(), vec![(day(2), 10.0), (day(4), 11.0), (day(5), 12.1)]),
    ])
    .unwrap();
    assert!(prices.prices()[[1, 1]].is_nan());

    let rets = ReturnSeries::from_prices(&prices).unwrap();
    assert_eq!(rets.dates(), &[day(4), day(5)]);
    assert_abs_diff_eq!(rets.values()[[0, 0]], 0.02, epsilon = 1e-12);
    assert_abs_diff_eq!(rets.values()[[0, 1]], 0.1, epsilon = 1e-12);
  }

  #[test]
  fn two_price_rows_are_not_enough() {
    let prices = PriceHistory::new(
      vec![day(2), day(3)],
      names(&["A", "B"]),
      array![[1.0, 2.0], [1.1, 2.2]],
    )
    .unwrap();
    let err = ReturnSeries::from_prices(&prices).unwrap_err();
    assert!(matches!(err, PortfolioError::DataUnavailable { .. }));
  }

  #[test]
  fn non_positive_price_names_the_asset() {
    let prices = PriceHistory::new(
      vec![day(2), day(3), day(4)],
      names(&["A", "B"]),
      array![[1.0, 2.0], [1.1, 0.0], [1.2, 2.1]],
    )
    .unwrap();
    let err = ReturnSeries::from_prices(&prices).unwrap_err();
    assert!(matches!(err, PortfolioError::DataUnavailable { ref symbol, .. } if symbol == "B"));
  }

  #[test]
  fn rejects_unsorted_dates_and_bad_shapes() {
    assert!(PriceHistory::new(vec![day(3), day(2)], names(&["A"]), array![[1.0], [2.0]]).is_err());
    assert!(PriceHistory::new(vec![day(2)], names(&["A", "B"]), array![[1.0]]).is_err());
  }

  #[test]
  fn select_and_between_slice_the_table() {
    let prices = PriceHistory::new(
      vec![day(2), day(3), day(4)],
      names(&["A", "B", "C"]),
      array![[1.0, 2.0, 3.0], [1.1, 2.1, 3.1], [1.2, 2.2, 3.2]],
    )
    .unwrap();

    let sub = prices.select(&names(&["C", "A"])).unwrap().between(day(3), day(4));
    assert_eq!(sub.assets(), &names(&["C", "A"]));
    assert_eq!(sub.dates(), &[day(3), day(4)]);
    assert_eq!(sub.prices(), &array![[3.1, 1.1], [3.2, 1.2]]);
    assert!(matches!(
      prices.select(&names(&["ZZZ"])),
      Err(PortfolioError::DataUnavailable { .. })
    ));
  }
}
