//! Sanity bounds for externally sourced USD quotes.
//!
//! A quote outside these bounds is treated the same as a quote the feed never
//! returned: absent.

/// Maximum reasonable token price in USD.
/// No legitimate reference asset costs more than $1 million per unit.
pub const MAX_TOKEN_USD_PRICE: f64 = 1e6;

/// Validate a USD price is within reasonable bounds.
/// Returns Some(price) if valid, None if invalid.
#[inline]
pub fn validate_usd_price(price: f64) -> Option<f64> {
    if price > 0.0 && price.is_finite() && price <= MAX_TOKEN_USD_PRICE {
        Some(price)
    } else {
        None
    }
}
