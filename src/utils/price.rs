//! Price normalization for Algebra / Uniswap V3 style pools.
//!
//! Converts the pool's `sqrtPriceX96` into human-denominated exchange rates,
//! adjusting for token decimals and for which side of the pool holds the
//! monitored (base) token.
//!
//! ## Price Convention:
//! - `(sqrtPriceX96 / 2^96)^2` = token1 per token0 in raw (smallest) units
//! - human price = raw price * 10^(decimals0 - decimals1)

use alloy::primitives::{Address, U256};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use once_cell::sync::Lazy;

use super::conversion::{big_pow10, u256_to_bigdecimal};
use crate::errors::ComputationError;

// ============================================
// Constants
// ============================================

/// 2^192, the scale of a squared sqrtPriceX96 (exact)
static Q192: Lazy<BigDecimal> = Lazy::new(|| BigDecimal::from(BigInt::from(1u8) << 192usize));

// ============================================
// Orientation
// ============================================

/// Which pool slot holds the base token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    BaseIsToken0,
    BaseIsToken1,
}

impl Orientation {
    /// Locate `base` among the pool tokens.
    ///
    /// Addresses compare by value, so checksummed, lower and upper case hex
    /// inputs all resolve identically.
    pub fn resolve(token0: Address, token1: Address, base: Address) -> Option<Self> {
        if token0 == base {
            Some(Orientation::BaseIsToken0)
        } else if token1 == base {
            Some(Orientation::BaseIsToken1)
        } else {
            None
        }
    }
}

/// Both directions of a pool's exchange rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPrice {
    /// token1 per token0, decimal adjusted, independent of orientation
    pub adjusted_price: f64,
    /// Quote units one base token is worth ("1 base = X quote")
    pub price_base_per_quote: f64,
    /// Base units one quote token is worth ("1 quote = X base")
    pub price_quote_per_base: f64,
    pub orientation: Orientation,
}

// ============================================
// sqrtPriceX96 to Price Conversion
// ============================================

/// `(sqrtPriceX96 / 2^96)^2` with full precision.
fn raw_price_decimal(sqrt_price_x96: U256) -> BigDecimal {
    let sqrt_price = u256_to_bigdecimal(sqrt_price_x96);
    (&sqrt_price * &sqrt_price) / &*Q192
}

/// Multiply by 10^(decimals0 - decimals1).
fn apply_decimal_adjustment(value: BigDecimal, decimals0: u8, decimals1: u8) -> BigDecimal {
    if decimals0 >= decimals1 {
        value * big_pow10(decimals0 - decimals1)
    } else {
        value / big_pow10(decimals1 - decimals0)
    }
}

/// Raw pool price (token1 per token0 in smallest units) as `f64`.
pub fn raw_price(sqrt_price_x96: U256) -> f64 {
    raw_price_decimal(sqrt_price_x96).to_f64().unwrap_or(f64::NAN)
}

/// Decimal adjusted token1-per-token0 price.
///
/// # Returns
/// * `Ok(price)` for a finite, strictly positive price
/// * `Err(ZeroPrice)` when the pool reports (or the value rounds to) zero
/// * `Err(NonFinite)` when the value does not fit an `f64`
pub fn adjusted_price(
    sqrt_price_x96: U256,
    decimals0: u8,
    decimals1: u8,
) -> Result<f64, ComputationError> {
    let raw = raw_price_decimal(sqrt_price_x96);
    let adjusted = apply_decimal_adjustment(raw, decimals0, decimals1);
    if adjusted.is_zero() {
        return Err(ComputationError::ZeroPrice);
    }

    let adjusted = adjusted.to_f64().ok_or(ComputationError::NonFinite)?;
    if !adjusted.is_finite() {
        return Err(ComputationError::NonFinite);
    }
    if adjusted == 0.0 {
        // Positive but below f64 range
        return Err(ComputationError::ZeroPrice);
    }

    Ok(adjusted)
}

/// Normalize raw pool state into both exchange rate directions.
///
/// ## Algorithm:
/// 1. adjusted = (sqrtPriceX96 / 2^96)^2 * 10^(decimals0 - decimals1)
/// 2. base == token0: base-per-quote = adjusted, quote-per-base = 1/adjusted
/// 3. base == token1: quote-per-base = adjusted, base-per-quote = 1/adjusted
/// 4. otherwise the orientation is unknown and no price is produced
pub fn normalize(
    sqrt_price_x96: U256,
    decimals0: u8,
    decimals1: u8,
    token0: Address,
    token1: Address,
    base: Address,
) -> Result<NormalizedPrice, ComputationError> {
    let orientation = Orientation::resolve(token0, token1, base).ok_or_else(|| {
        ComputationError::UnknownOrientation {
            token0: token0.to_string(),
            token1: token1.to_string(),
            base: base.to_string(),
        }
    })?;

    let adjusted = adjusted_price(sqrt_price_x96, decimals0, decimals1)?;
    let inverse = 1.0 / adjusted;
    if !inverse.is_finite() || inverse == 0.0 {
        return Err(ComputationError::NonFinite);
    }

    let (price_base_per_quote, price_quote_per_base) = match orientation {
        Orientation::BaseIsToken0 => (adjusted, inverse),
        Orientation::BaseIsToken1 => (inverse, adjusted),
    };

    Ok(NormalizedPrice {
        adjusted_price: adjusted,
        price_base_per_quote,
        price_quote_per_base,
        orientation,
    })
}
