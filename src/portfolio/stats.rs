//! # Return Statistics
//!
//! $$
//! \hat\mu_i = \frac1T\sum_t r_{i,t},\qquad
//! \hat\Sigma_{ij} = \frac{1}{T-1}\sum_t (r_{i,t}-\hat\mu_i)(r_{j,t}-\hat\mu_j)
//! $$
//!
//! Sample moments of daily simple returns.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray_stats::CorrelationExt;

use super::data::PriceHistory;
use super::data::ReturnSeries;
use crate::error::PortfolioError;
use crate::error::Result;

/// Mean daily return per asset and the sample covariance of returns.
#[derive(Clone, Debug)]
pub struct ReturnStatistics {
  assets: Vec<String>,
  mean: Array1<f64>,
  covariance: Array2<f64>,
}

impl ReturnStatistics {
  /// Build directly from moments, e.g. externally estimated ones.
  pub fn new(assets: Vec<String>, mean: Array1<f64>, covariance: Array2<f64>) -> Result<Self> {
    let n = assets.len();
    if n < 2 {
      return Err(PortfolioError::config(format!(
        "at least 2 assets are required, got {n}"
      )));
    }
    if mean.len() != n || covariance.dim() != (n, n) {
      return Err(PortfolioError::invalid(
        "statistics",
        format!(
          "expected {n} means and a {n}x{n} covariance, got {} and {:?}",
          mean.len(),
          covariance.dim()
        ),
      ));
    }
    if mean.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
      return Err(PortfolioError::invalid("statistics", "non-finite moment"));
    }
    for i in 0..n {
      if covariance[[i, i]] < 0.0 {
        return Err(PortfolioError::invalid(
          "covariance",
          format!("negative variance for {}", assets[i]),
        ));
      }
    }
    // Symmetrize to absorb rounding noise.
    let covariance = (&covariance + &covariance.t()) * 0.5;

    Ok(Self {
      assets,
      mean,
      covariance,
    })
  }

  /// Sample mean and covariance (divisor `T - 1`) of a return series.
  pub fn from_returns(returns: &ReturnSeries) -> Result<Self> {
    let symbol = returns.assets().join(",");
    if returns.n_periods() < 2 {
      return Err(PortfolioError::data(
        symbol,
        "covariance needs at least 2 return rows",
      ));
    }

    let mean = returns
      .values()
      .mean_axis(Axis(0))
      .ok_or_else(|| PortfolioError::data(symbol.as_str(), "empty return series"))?;
    let covariance = returns
      .values()
      .t()
      .cov(1.0)
      .map_err(|e| PortfolioError::data(symbol.as_str(), e.to_string()))?;

    Self::new(returns.assets().to_vec(), mean, covariance)
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  /// Mean daily return per asset, aligned with [`Self::assets`].
  pub fn mean(&self) -> &Array1<f64> {
    &self.mean
  }

  pub fn covariance(&self) -> &Array2<f64> {
    &self.covariance
  }

  pub fn mean_of(&self, asset: &str) -> Option<f64> {
    self.index_of(asset).map(|i| self.mean[i])
  }

  pub fn covariance_of(&self, a: &str, b: &str) -> Option<f64> {
    Some(self.covariance[[self.index_of(a)?, self.index_of(b)?]])
  }

  fn index_of(&self, asset: &str) -> Option<usize> {
    self.assets.iter().position(|a| a == asset)
  }
}

/// Estimate return statistics from a price history.
pub fn estimate(prices: &PriceHistory) -> Result<ReturnStatistics> {
  let returns = ReturnSeries::from_prices(prices)?;
  ReturnStatistics::from_returns(&returns)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::NaiveDate;
  use ndarray::array;

  use super::*;

  fn prices() -> PriceHistory {
    let dates = (1..=5)
      .map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
      .collect();
    PriceHistory::new(
      dates,
      vec!["A".into(), "B".into()],
      array![
        [100.0, 20.0],
        [102.0, 19.8],
        [101.0, 20.2],
        [103.0, 20.0],
        [104.0, 20.6]
      ],
    )
    .unwrap()
  }

  #[test]
  fn matches_hand_computed_moments() {
    let rets = ReturnSeries::from_prices(&prices()).unwrap();
    let stats = ReturnStatistics::from_returns(&rets).unwrap();

    let a: Vec<f64> = rets.values().column(0).to_vec();
    let b: Vec<f64> = rets.values().column(1).to_vec();
    let ma = a.iter().sum::<f64>() / 4.0;
    let mb = b.iter().sum::<f64>() / 4.0;
    let cov_ab = a
      .iter()
      .zip(&b)
      .map(|(x, y)| (x - ma) * (y - mb))
      .sum::<f64>()
      / 3.0;
    let var_a = a.iter().map(|x| (x - ma).powi(2)).sum::<f64>() / 3.0;

    assert_abs_diff_eq!(stats.mean_of("A").unwrap(), ma, epsilon = 1e-15);
    assert_abs_diff_eq!(stats.mean_of("B").unwrap(), mb, epsilon = 1e-15);
    assert_abs_diff_eq!(stats.covariance_of("A", "A").unwrap(), var_a, epsilon = 1e-15);
    assert_abs_diff_eq!(stats.covariance_of("A", "B").unwrap(), cov_ab, epsilon = 1e-15);
    assert_eq!(stats.covariance_of("A", "B"), stats.covariance_of("B", "A"));
    assert!(stats.mean_of("C").is_none());
  }

  #[test]
  fn estimate_rejects_single_return_row() {
    let short = prices().between(
      NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
      NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
    );
    assert!(matches!(
      estimate(&short),
      Err(PortfolioError::DataUnavailable { .. })
    ));
  }

  #[test]
  fn new_validates_shapes() {
    let assets = vec!["A".to_string(), "B".to_string()];
    assert!(ReturnStatistics::new(assets.clone(), array![0.1], array![[1.0, 0.0], [0.0, 1.0]]).is_err());
    assert!(
      ReturnStatistics::new(assets, array![0.1, 0.2], array![[-1.0, 0.0], [0.0, 1.0]]).is_err()
    );
  }
}
