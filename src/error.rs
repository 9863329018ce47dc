//! # Errors
//!
//! Failure taxonomy shared by every pipeline stage.

use thiserror::Error;

/// Errors surfaced by the allocation pipeline.
#[derive(Debug, Error)]
pub enum PortfolioError {
  /// The provider returned nothing usable for `symbol`.
  #[error("data unavailable for {symbol}: {reason}")]
  DataUnavailable { symbol: String, reason: String },

  /// Rejected session or solver settings.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// The constrained solver did not reach a feasible optimum.
  #[error("optimizer did not converge after {iterations} iterations: {reason}")]
  Convergence { iterations: u64, reason: String },

  /// `operation` was requested before `required` completed.
  #[error("{operation} requires {required} to complete first")]
  Precondition {
    operation: &'static str,
    required: &'static str,
  },

  /// Caller-supplied value has the wrong shape or is not finite.
  #[error("invalid input: {field} ({reason})")]
  InvalidInput { field: String, reason: String },
}

impl PortfolioError {
  pub(crate) fn data(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::DataUnavailable {
      symbol: symbol.into(),
      reason: reason.into(),
    }
  }

  pub(crate) fn config(reason: impl Into<String>) -> Self {
    Self::Configuration(reason.into())
  }

  pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::InvalidInput {
      field: field.into(),
      reason: reason.into(),
    }
  }
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
