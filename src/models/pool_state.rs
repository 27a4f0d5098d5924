use alloy::primitives::{Address, U256};

/// On-chain state of an Algebra pool as read in one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolState {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub decimals0: u8,
    pub decimals1: u8,
    /// First field of `globalState()`
    pub sqrt_price_x96: U256,
    /// None when `liquidity()` is unavailable on the pool
    pub liquidity: Option<u128>,
}
