//! Utility functions for the monitor.
//!
//! - [`conversion`] - Type conversions (U256 to BigDecimal, powers of ten)
//! - [`price`] - sqrtPriceX96 normalization into exchange rates
//! - [`validation`] - Sanity bounds for external USD quotes

mod conversion;
mod price;
mod validation;

// Conversion utilities
pub use conversion::u256_to_bigdecimal;

// Price normalization
pub use price::{adjusted_price, normalize, raw_price, NormalizedPrice, Orientation};

// Validation utilities
pub use validation::{validate_usd_price, MAX_TOKEN_USD_PRICE};
