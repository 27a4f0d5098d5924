use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use url::Url;

use super::PriceFeed;
use crate::errors::MonitorError;
use crate::models::ReferenceAsset;

/// CoinGecko-backed price feed.
/// Fetches spot prices in USD via `/simple/price`, one asset per request.
pub struct CoingeckoFeed {
    client: Client,
    base: Url,
}

impl CoingeckoFeed {
    pub fn new(base_url: &str) -> Result<Self, MonitorError> {
        let base = Url::parse(base_url).map_err(|e| {
            MonitorError::Configuration(format!("invalid price feed URL {}: {}", base_url, e))
        })?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn request_url(&self, asset: ReferenceAsset) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("ids", asset.coingecko_id())
            .append_pair("vs_currencies", "usd");
        url
    }
}

#[async_trait]
impl PriceFeed for CoingeckoFeed {
    async fn usd_price(&self, asset: ReferenceAsset) -> Result<f64, MonitorError> {
        let resp = self
            .client
            .get(self.request_url(asset))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| MonitorError::UpstreamFeed(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| MonitorError::UpstreamFeed(format!("non-success status: {}", e)))?;

        let body = resp
            .bytes()
            .await
            .map_err(|e| MonitorError::UpstreamFeed(format!("read body failed: {}", e)))?;

        debug!(
            "CoinGecko {} response: {}",
            asset.symbol(),
            String::from_utf8_lossy(&body)
        );

        parse_usd_price(&body, asset.coingecko_id())
    }
}

/// Extract `{"<id>": {"usd": <price>}}` from a `/simple/price` body.
fn parse_usd_price(body: &[u8], id: &str) -> Result<f64, MonitorError> {
    // Unknown ids come back as an empty object, prices may be null
    let parsed: HashMap<String, HashMap<String, Option<f64>>> = serde_json::from_slice(body)
        .map_err(|e| MonitorError::UpstreamFeed(format!("parse JSON failed: {}", e)))?;

    parsed
        .get(id)
        .and_then(|quotes| quotes.get("usd").copied().flatten())
        .ok_or_else(|| MonitorError::UpstreamFeed(format!("usd missing for id: {}", id)))
}
