use thiserror::Error;

/// Failures the calculation core reports to its caller.
///
/// Business outcomes (LCL, weight clipping, an envelope the box cannot use)
/// are ordinary result values; only malformed input lands here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("invalid {field}: {value} (must be a positive number)")]
    InvalidDimension { field: &'static str, value: f64 },
    #[error("invalid {field}: {value}")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("box does not fit any container type ({0})")]
    InfeasibleGeometry(String),
    #[error("no usable exchange rate for {currency}")]
    InvalidCurrencyRate { currency: String },
}
