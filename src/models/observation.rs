use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use super::{PoolState, QuoteAsset, ReferenceAsset, ReferencePrices};
use crate::utils::NormalizedPrice;

/// Decimal counts of the two pooled tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenDecimals {
    pub token0: u8,
    pub token1: u8,
}

/// One line of the observation log.
///
/// Created once per pool per cycle, appended to the log and never modified.
///
/// Schema:
/// - `quote_asset` tags the pool (`usdc`, `eth`, `pol`) instead of encoding
///   the asset in the price field names
/// - `price_base_per_quote` is what one base token is worth in the quote
///   asset, `price_quote_per_base` its reciprocal
/// - `sqrt_price_x96` is written as an exact JSON integer
/// - `eth_usd` is only set on ETH pools and `pol_usd` only on POL pools;
///   both are `null` when the feed had no usable quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolObservation {
    pub timestamp: DateTime<Utc>,
    pub pair: String,
    pub quote_asset: QuoteAsset,
    pub price_base_per_quote: f64,
    pub price_quote_per_base: f64,
    pub pool_address: String,
    pub token0: String,
    pub token1: String,
    pub decimals: TokenDecimals,
    #[serde(serialize_with = "serialize_exact_integer")]
    pub sqrt_price_x96: U256,
    pub liquidity: Option<u128>,
    pub eth_usd: Option<f64>,
    pub pol_usd: Option<f64>,
}

impl PoolObservation {
    pub fn new(
        timestamp: DateTime<Utc>,
        pair: String,
        quote_asset: QuoteAsset,
        state: &PoolState,
        price: &NormalizedPrice,
        reference: &ReferencePrices,
    ) -> Self {
        let usd = reference.for_quote(quote_asset);
        let (eth_usd, pol_usd) = match quote_asset.reference_asset() {
            Some(ReferenceAsset::Eth) => (usd, None),
            Some(ReferenceAsset::Pol) => (None, usd),
            None => (None, None),
        };

        Self {
            timestamp,
            pair,
            quote_asset,
            price_base_per_quote: price.price_base_per_quote,
            price_quote_per_base: price.price_quote_per_base,
            pool_address: state.address.to_checksum(None),
            token0: state.token0.to_checksum(None),
            token1: state.token1.to_checksum(None),
            decimals: TokenDecimals {
                token0: state.decimals0,
                token1: state.decimals1,
            },
            sqrt_price_x96: state.sqrt_price_x96,
            liquidity: state.liquidity,
            eth_usd,
            pol_usd,
        }
    }

    /// Serialize as a single NDJSON line (without the trailing newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Write a U256 as a bare JSON number, keeping every digit.
fn serialize_exact_integer<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    let raw = RawValue::from_string(value.to_string()).map_err(serde::ser::Error::custom)?;
    raw.serialize(serializer)
}
