//! External USD price feed.

mod coingecko;

pub use coingecko::CoingeckoFeed;

use async_trait::async_trait;
use log::{info, warn};

use crate::errors::MonitorError;
use crate::models::{ReferenceAsset, ReferencePrices};
use crate::utils::validate_usd_price;

/// Source of current USD prices for the reference assets.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current USD price of `asset`.
    ///
    /// Returns `Err(MonitorError::UpstreamFeed)` when the request fails or the
    /// response holds no price for the asset.
    async fn usd_price(&self, asset: ReferenceAsset) -> Result<f64, MonitorError>;
}

/// Fetch both reference quotes for a cycle.
///
/// Each asset is requested separately and falls back to `None` on its own, so
/// a failed ETH lookup never discards a good POL quote (and vice versa).
pub async fn fetch_reference_prices<F: PriceFeed + ?Sized>(feed: &F) -> ReferencePrices {
    let eth_usd = fetch_one(feed, ReferenceAsset::Eth).await;
    let pol_usd = fetch_one(feed, ReferenceAsset::Pol).await;
    ReferencePrices::new(eth_usd, pol_usd)
}

async fn fetch_one<F: PriceFeed + ?Sized>(feed: &F, asset: ReferenceAsset) -> Option<f64> {
    match feed.usd_price(asset).await {
        Ok(price) => match validate_usd_price(price) {
            Some(price) => {
                info!("{}/USD: {}", asset.symbol(), price);
                Some(price)
            },
            None => {
                warn!(
                    "Discarding implausible {}/USD quote {}, recording no price",
                    asset.symbol(),
                    price
                );
                None
            },
        },
        Err(e) => {
            warn!(
                "Failed to fetch {} price: {}. Recording no {}/USD price",
                asset.symbol(),
                e,
                asset.symbol()
            );
            None
        },
    }
}
