//! # Yahoo Finance
//!
//! $$
//! \text{quote}_t \mapsto (t, \text{adjclose}_t)
//! $$
//!
//! Daily adjusted closes and yield-index quotes from Yahoo Finance.

use chrono::DateTime;
use chrono::NaiveDate;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api::YahooConnector;

use super::MarketDataProvider;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::portfolio::data::PriceHistory;

/// Blocking adapter over the async `yahoo_finance_api` client.
pub struct YahooProvider {
  connector: YahooConnector,
}

impl YahooProvider {
  pub fn new() -> Result<Self> {
    let connector = YahooConnector::new()
      .map_err(|e| PortfolioError::data("yahoo", format!("cannot build client: {e}")))?;
    Ok(Self { connector })
  }

  /// `(date, adjusted close)` pairs for one symbol, inclusive of `end`.
  fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<(NaiveDate, f64)>> {
    let from = to_offset(symbol, start)?;
    let to = to_offset(symbol, end.succ_opt().unwrap_or(end))?;
    let response = tokio_test::block_on(self.connector.get_quote_history(symbol, from, to))
      .map_err(|e| PortfolioError::data(symbol, e.to_string()))?;
    let quotes = response
      .quotes()
      .map_err(|e| PortfolioError::data(symbol, e.to_string()))?;

    let observations: Vec<(NaiveDate, f64)> = quotes
      .iter()
      .filter_map(|q| {
        DateTime::from_timestamp(q.timestamp as i64, 0).map(|dt| (dt.date_naive(), q.adjclose))
      })
      .filter(|(d, _)| *d >= start && *d <= end)
      .collect();
    if observations.is_empty() {
      return Err(PortfolioError::data(symbol, "empty quote history"));
    }
    debug!(symbol, rows = observations.len(), "fetched quote history");
    Ok(observations)
  }
}

fn to_offset(symbol: &str, date: NaiveDate) -> Result<OffsetDateTime> {
  let ts = date
    .and_hms_opt(0, 0, 0)
    .map(|dt| dt.and_utc().timestamp())
    .ok_or_else(|| PortfolioError::data(symbol, format!("invalid date {date}")))?;
  OffsetDateTime::from_unix_timestamp(ts)
    .map_err(|e| PortfolioError::data(symbol, format!("invalid date {date}: {e}")))
}

impl MarketDataProvider for YahooProvider {
  fn fetch_prices(
    &self,
    assets: &[String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PriceHistory> {
    let mut series = Vec::with_capacity(assets.len());
    for asset in assets {
      series.push((asset.clone(), self.history(asset, start, end)?));
    }
    // Multiple quotes can share a calendar day around exchange-local midnight.
    for (_, obs) in &mut series {
      obs.dedup_by_key(|(d, _)| *d);
    }
    PriceHistory::from_series(series)
  }

  fn fetch_risk_free_series(
    &self,
    proxy: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<f64>> {
    Ok(
      self
        .history(proxy, start, end)?
        .into_iter()
        .map(|(_, y)| y)
        .collect(),
    )
  }
}
