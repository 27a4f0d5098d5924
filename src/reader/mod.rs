//! Read-only access to chain state.

mod rpc;

pub use rpc::RpcReader;

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::errors::MonitorError;
use crate::models::PoolState;

/// ERC-20 metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Contract reads the monitor depends on.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Connectivity check. Returns the chain id of the endpoint.
    async fn chain_id(&self) -> Result<u64, MonitorError>;

    /// `symbol()` and `decimals()` of an ERC-20 token.
    async fn token_info(&self, token: Address) -> Result<TokenInfo, MonitorError>;

    /// Tokens, decimals, sqrt price and (if available) liquidity of a pool.
    ///
    /// A failing `liquidity()` call is not an error: the state is returned
    /// with `liquidity: None`.
    async fn pool_state(&self, pool: Address) -> Result<PoolState, MonitorError>;
}
