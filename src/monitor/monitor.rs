use std::panic::AssertUnwindSafe;

use anyhow::Result;
use chrono::Utc;
use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::errors::{ComputationError, MonitorError};
use crate::feed::{fetch_reference_prices, CoingeckoFeed, PriceFeed};
use crate::models::{PoolObservation, QuoteAsset, ReferencePrices};
use crate::reader::{ChainReader, RpcReader};
use crate::sink::ObservationLog;
use crate::utils::normalize;

/// Outcome of a single poll cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub reference: ReferencePrices,
    /// Pools whose observation was appended, in evaluation order
    pub recorded: Vec<QuoteAsset>,
    /// Pools skipped this cycle
    pub skipped: Vec<QuoteAsset>,
}

/// Fixed-interval pool price monitor.
///
/// Each cycle fetches the USD reference quotes, then evaluates the USDC, ETH
/// and POL pools one after another. A failing pool is logged and skipped; the
/// remaining pools of the cycle are still evaluated.
pub struct Monitor<R, F> {
    settings: Settings,
    reader: R,
    feed: F,
    sink: ObservationLog,
}

impl Monitor<RpcReader, CoingeckoFeed> {
    /// Wire the RPC reader, CoinGecko feed and observation log from `settings`.
    ///
    /// Fails on a malformed RPC or price feed URL; nothing is contacted yet.
    pub fn from_settings(settings: Settings) -> Result<Self, MonitorError> {
        let reader = RpcReader::new(&settings.rpc_url)?;
        let feed = CoingeckoFeed::new(&settings.price_feed_url)?;
        let sink = ObservationLog::new(settings.observation_log_path.clone());
        Ok(Self::new(settings, reader, feed, sink))
    }
}

impl<R: ChainReader, F: PriceFeed> Monitor<R, F> {
    pub fn new(settings: Settings, reader: R, feed: F, sink: ObservationLog) -> Self {
        Self {
            settings,
            reader,
            feed,
            sink,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Verify the RPC endpoint answers. Returns its chain id.
    pub async fn check_connection(&self) -> Result<u64, MonitorError> {
        self.reader.chain_id().await
    }

    /// Log symbol and decimals of the base and USDC tokens.
    pub async fn report_tokens(&self) {
        for (key, token) in [
            ("SHT_ADDRESS", self.settings.base_token()),
            ("USDC_ADDRESS", self.settings.usdc_token()),
        ] {
            let token = match token {
                Ok(token) => token,
                Err(e) => {
                    warn!("Skipping token report for {}: {}", key, e);
                    continue;
                },
            };

            match self.reader.token_info(token).await {
                Ok(token_info) => info!("{} decimals: {}", token_info.symbol, token_info.decimals),
                Err(e) => warn!("Failed to read token info for {}: {}", token, e),
            }
        }
    }

    /// Poll until `cancellation_token` is cancelled.
    ///
    /// A cycle that panics is logged and the loop carries on with the next
    /// interval.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let interval = self.settings.poll_interval();
        info!(
            "Polling {} pools every {}s",
            QuoteAsset::ALL.len(),
            interval.as_secs()
        );

        while !cancellation_token.is_cancelled() {
            match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                Ok(summary) => debug!(
                    "Cycle finished: {} recorded, {} skipped",
                    summary.recorded.len(),
                    summary.skipped.len()
                ),
                Err(_) => error!("Poll cycle aborted unexpectedly, continuing"),
            }

            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {},
            }
        }

        info!("Monitor stopped");
        Ok(())
    }

    /// One full cycle: reference prices, then every pool in order.
    pub async fn run_cycle(&self) -> CycleSummary {
        let reference = fetch_reference_prices(&self.feed).await;
        info!(
            "ETH/USD: {}, POL/USD: {}",
            format_quote(reference.eth_usd),
            format_quote(reference.pol_usd)
        );

        let mut summary = CycleSummary {
            reference,
            ..Default::default()
        };

        for quote in QuoteAsset::ALL {
            let label = quote.pair_label(&self.settings.base_symbol);

            match self.evaluate_pool(quote, &label, &reference).await {
                Ok(observation) => match self.sink.append(&observation).await {
                    Ok(()) => summary.recorded.push(quote),
                    Err(e) => {
                        error!("{} price fetch failed: {}", label, e);
                        summary.skipped.push(quote);
                    },
                },
                Err(MonitorError::Computation(
                    e @ ComputationError::UnknownOrientation { .. },
                )) => {
                    warn!("{}: {}", label, e);
                    summary.skipped.push(quote);
                },
                Err(e) => {
                    error!("{} price fetch failed: {}", label, e);
                    summary.skipped.push(quote);
                },
            }
        }

        summary
    }

    /// Read, normalize and build the observation for one pool.
    pub async fn evaluate_pool(
        &self,
        quote: QuoteAsset,
        label: &str,
        reference: &ReferencePrices,
    ) -> Result<PoolObservation, MonitorError> {
        let pool = self.settings.pool_address(quote)?;
        let base = self.settings.base_token()?;

        let state = self.reader.pool_state(pool).await?;
        let price = normalize(
            state.sqrt_price_x96,
            state.decimals0,
            state.decimals1,
            state.token0,
            state.token1,
            base,
        )?;

        let base_symbol = &self.settings.base_symbol;
        info!(
            "{}: 1 {} = {:.6} {}",
            label,
            base_symbol,
            price.price_base_per_quote,
            quote.symbol()
        );
        info!(
            "{}: 1 {} = {:.6} {}",
            label,
            quote.symbol(),
            price.price_quote_per_base,
            base_symbol
        );

        Ok(PoolObservation::new(
            Utc::now(),
            label.to_string(),
            quote,
            &state,
            &price,
            reference,
        ))
    }
}

fn format_quote(quote: Option<f64>) -> String {
    quote.map_or_else(|| "unavailable".to_string(), |price| price.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PoolState, ReferenceAsset};
    use crate::reader::TokenInfo;
    use alloy::primitives::{address, Address, U256};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    const SHT: Address = address!("0x1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d");
    const USDC: Address = address!("0x3c499c542cef5e3811e1192ce70d8cc03d5c3359");
    const WETH: Address = address!("0x7ceb23fd6bc0add59e62ac25578270cff1b9f619");
    const WPOL: Address = address!("0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270");

    const USDC_POOL: Address = address!("0x00000000000000000000000000000000000000a1");
    const ETH_POOL: Address = address!("0x00000000000000000000000000000000000000a2");
    const POL_POOL: Address = address!("0x00000000000000000000000000000000000000a3");

    struct FakeReader {
        pools: HashMap<Address, PoolState>,
        panic_on: Option<Address>,
    }

    #[async_trait]
    impl ChainReader for FakeReader {
        async fn chain_id(&self) -> Result<u64, MonitorError> {
            Ok(137)
        }

        async fn token_info(&self, _token: Address) -> Result<TokenInfo, MonitorError> {
            Ok(TokenInfo {
                symbol: "SHT".to_string(),
                decimals: 18,
            })
        }

        async fn pool_state(&self, pool: Address) -> Result<PoolState, MonitorError> {
            if self.panic_on == Some(pool) {
                panic!("node returned garbage");
            }
            self.pools
                .get(&pool)
                .cloned()
                .ok_or_else(|| MonitorError::Rpc(format!("globalState() on {}: reverted", pool)))
        }
    }

    struct FixedFeed {
        eth: Option<f64>,
        pol: Option<f64>,
    }

    #[async_trait]
    impl PriceFeed for FixedFeed {
        async fn usd_price(&self, asset: ReferenceAsset) -> Result<f64, MonitorError> {
            let price = match asset {
                ReferenceAsset::Eth => self.eth,
                ReferenceAsset::Pol => self.pol,
            };
            price.ok_or_else(|| MonitorError::UpstreamFeed("rate limited".to_string()))
        }
    }

    fn pool(address: Address, token0: Address, token1: Address, d0: u8, d1: u8) -> PoolState {
        PoolState {
            address,
            token0,
            token1,
            decimals0: d0,
            decimals1: d1,
            sqrt_price_x96: U256::from(1u8) << 96usize,
            liquidity: Some(1_000_000),
        }
    }

    fn healthy_pools() -> HashMap<Address, PoolState> {
        HashMap::from([
            (USDC_POOL, pool(USDC_POOL, SHT, USDC, 18, 6)),
            (ETH_POOL, pool(ETH_POOL, WETH, SHT, 18, 18)),
            (POL_POOL, pool(POL_POOL, SHT, WPOL, 18, 18)),
        ])
    }

    fn settings(log_path: PathBuf) -> Settings {
        Settings {
            rpc_url: "http://localhost:8545".to_string(),
            sht_address: Some(SHT.to_string()),
            usdc_address: Some(USDC.to_string()),
            pool_usdc_address: Some(USDC_POOL.to_string()),
            pool_eth_address: Some(ETH_POOL.to_string()),
            pool_pol_address: Some(POL_POOL.to_string()),
            base_symbol: "SHT".to_string(),
            poll_interval_secs: 3600,
            observation_log_path: log_path,
            price_feed_url: "http://localhost/simple/price".to_string(),
            log_level: "info".to_string(),
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        log_path: PathBuf,
        monitor: Monitor<FakeReader, FixedFeed>,
    }

    fn harness(
        pools: HashMap<Address, PoolState>,
        feed: FixedFeed,
        configure: impl FnOnce(&mut Settings),
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("data").join("price_log.jsonl");
        let mut settings = settings(log_path.clone());
        configure(&mut settings);

        let reader = FakeReader {
            pools,
            panic_on: None,
        };
        let monitor = Monitor::new(settings, reader, feed, ObservationLog::new(&log_path));
        Harness {
            _dir: dir,
            log_path,
            monitor,
        }
    }

    fn read_lines(path: &PathBuf) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn full_feed() -> FixedFeed {
        FixedFeed {
            eth: Some(2450.0),
            pol: Some(0.21),
        }
    }

    #[tokio::test]
    async fn test_cycle_records_all_pools_in_order() {
        let h = harness(healthy_pools(), full_feed(), |_| {});

        let summary = h.monitor.run_cycle().await;
        assert_eq!(summary.recorded, QuoteAsset::ALL.to_vec());
        assert!(summary.skipped.is_empty());

        let lines = read_lines(&h.log_path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["pair"], "SHT/USDC");
        assert_eq!(lines[1]["pair"], "SHT/ETH");
        assert_eq!(lines[2]["pair"], "SHT/POL");

        // SHT is token0 with 18 vs 6 decimals: 1 SHT = 1e12 USDC
        assert_eq!(lines[0]["price_base_per_quote"], 1e12);
        assert!(lines[0]["eth_usd"].is_null() && lines[0]["pol_usd"].is_null());

        assert_eq!(lines[1]["quote_asset"], "eth");
        assert_eq!(lines[1]["eth_usd"], 2450.0);
        assert!(lines[1]["pol_usd"].is_null());

        assert_eq!(lines[2]["pol_usd"], 0.21);
        assert!(lines[2]["eth_usd"].is_null());
    }

    #[tokio::test]
    async fn test_missing_pool_config_skips_only_that_pool() {
        let h = harness(healthy_pools(), full_feed(), |s| s.pool_eth_address = None);

        let summary = h.monitor.run_cycle().await;
        assert_eq!(summary.recorded, vec![QuoteAsset::Usdc, QuoteAsset::Pol]);
        assert_eq!(summary.skipped, vec![QuoteAsset::Eth]);
        assert_eq!(read_lines(&h.log_path).len(), 2);
    }

    #[tokio::test]
    async fn test_rpc_failure_is_isolated() {
        let mut pools = healthy_pools();
        pools.remove(&USDC_POOL);
        let h = harness(pools, full_feed(), |_| {});

        let summary = h.monitor.run_cycle().await;
        assert_eq!(summary.skipped, vec![QuoteAsset::Usdc]);
        assert_eq!(summary.recorded, vec![QuoteAsset::Eth, QuoteAsset::Pol]);
    }

    #[tokio::test]
    async fn test_unknown_orientation_and_zero_price_are_dropped() {
        let mut pools = healthy_pools();
        pools.insert(ETH_POOL, pool(ETH_POOL, WETH, USDC, 18, 6));
        let mut zero = pool(POL_POOL, SHT, WPOL, 18, 18);
        zero.sqrt_price_x96 = U256::ZERO;
        pools.insert(POL_POOL, zero);
        let h = harness(pools, full_feed(), |_| {});

        let summary = h.monitor.run_cycle().await;
        assert_eq!(summary.recorded, vec![QuoteAsset::Usdc]);
        assert_eq!(summary.skipped, vec![QuoteAsset::Eth, QuoteAsset::Pol]);

        let lines = read_lines(&h.log_path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["pair"], "SHT/USDC");
    }

    #[tokio::test]
    async fn test_missing_base_token_skips_every_pool() {
        let h = harness(healthy_pools(), full_feed(), |s| s.sht_address = None);

        let summary = h.monitor.run_cycle().await;
        assert!(summary.recorded.is_empty());
        assert_eq!(summary.skipped.len(), 3);
        assert!(!h.log_path.exists());
    }

    #[tokio::test]
    async fn test_feed_outage_records_null_quotes() {
        let feed = FixedFeed {
            eth: None,
            pol: Some(0.21),
        };
        let h = harness(healthy_pools(), feed, |_| {});

        let summary = h.monitor.run_cycle().await;
        assert_eq!(summary.reference, ReferencePrices::new(None, Some(0.21)));
        assert_eq!(summary.recorded.len(), 3);

        let lines = read_lines(&h.log_path);
        assert!(lines[1]["eth_usd"].is_null());
        assert_eq!(lines[2]["pol_usd"], 0.21);
    }

    #[tokio::test]
    async fn test_evaluate_pool_orients_by_base_token() {
        let h = harness(healthy_pools(), full_feed(), |_| {});
        let reference = ReferencePrices::new(Some(2450.0), Some(0.21));

        // SHT is token1 of the ETH pool; equal decimals and unit price
        let observation = h
            .monitor
            .evaluate_pool(QuoteAsset::Eth, "SHT/ETH", &reference)
            .await
            .unwrap();
        assert_eq!(observation.price_base_per_quote, 1.0);
        assert_eq!(observation.price_quote_per_base, 1.0);
        assert_eq!(observation.token1, SHT.to_checksum(None));
        assert_eq!(observation.eth_usd, Some(2450.0));
        assert_eq!(observation.pol_usd, None);
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let h = harness(healthy_pools(), full_feed(), |_| {});
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        h.monitor.run(token).await.unwrap();
        assert_eq!(read_lines(&h.log_path).len(), 3);
    }

    #[tokio::test]
    async fn test_run_survives_panicking_cycle() {
        let mut h = harness(healthy_pools(), full_feed(), |_| {});
        h.monitor.reader.panic_on = Some(ETH_POOL);
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        assert!(h.monitor.run(token).await.is_ok());
        // USDC was written before the ETH pool aborted the cycle
        assert_eq!(read_lines(&h.log_path).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_liquidity_still_records() {
        let mut pools = healthy_pools();
        let mut no_liquidity = pool(ETH_POOL, WETH, SHT, 18, 18);
        no_liquidity.liquidity = None;
        pools.insert(ETH_POOL, no_liquidity);
        let h = harness(pools, full_feed(), |_| {});

        let summary = h.monitor.run_cycle().await;
        assert_eq!(summary.recorded, QuoteAsset::ALL.to_vec());

        let lines = read_lines(&h.log_path);
        assert_eq!(lines[1]["pair"], "SHT/ETH");
        assert!(lines[1]["liquidity"].is_null());
        assert_eq!(lines[1]["price_base_per_quote"], 1.0);
        assert_eq!(lines[0]["liquidity"], 1_000_000);
    }

    #[test]
    fn test_from_settings_rejects_bad_urls() {
        type Live = Monitor<RpcReader, CoingeckoFeed>;

        let mut bad_feed = settings(PathBuf::from("price_log.jsonl"));
        bad_feed.price_feed_url = "coingecko".to_string();
        assert!(matches!(
            Live::from_settings(bad_feed),
            Err(MonitorError::Configuration(_))
        ));

        let mut bad_rpc = settings(PathBuf::from("price_log.jsonl"));
        bad_rpc.rpc_url = "polygon rpc".to_string();
        assert!(matches!(
            Live::from_settings(bad_rpc),
            Err(MonitorError::Connectivity(_))
        ));

        let monitor = Live::from_settings(settings(PathBuf::from("price_log.jsonl"))).unwrap();
        assert_eq!(monitor.sink.path(), PathBuf::from("price_log.jsonl").as_path());
    }

    #[tokio::test]
    async fn test_check_connection() {
        let h = harness(HashMap::new(), full_feed(), |_| {});
        assert_eq!(h.monitor.check_connection().await.unwrap(), 137);
    }
}
