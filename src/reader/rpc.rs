use std::fmt::Display;

use alloy::{
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use log::warn;
use url::Url;

use super::{ChainReader, TokenInfo};
use crate::abis::{IAlgebraPool, IERC20};
use crate::errors::MonitorError;
use crate::models::PoolState;

/// `ChainReader` over a JSON-RPC HTTP endpoint.
///
/// Calls are issued one at a time and without a timeout; a slow node simply
/// stretches the poll cycle.
#[derive(Clone)]
pub struct RpcReader {
    provider: DynProvider,
}

impl RpcReader {
    pub fn new(rpc_url: &str) -> Result<Self, MonitorError> {
        let url = Url::parse(rpc_url).map_err(|e| {
            MonitorError::Connectivity(format!("invalid RPC URL {}: {}", rpc_url, e))
        })?;

        let client = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            provider: DynProvider::new(client),
        })
    }

    async fn decimals(&self, token: Address) -> Result<u8, MonitorError> {
        IERC20::new(token, &self.provider)
            .decimals()
            .call()
            .await
            .map_err(|e| rpc_error(token, "decimals()", e))
    }
}

#[async_trait]
impl ChainReader for RpcReader {
    async fn chain_id(&self) -> Result<u64, MonitorError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| MonitorError::Connectivity(e.to_string()))
    }

    async fn token_info(&self, token: Address) -> Result<TokenInfo, MonitorError> {
        let symbol = IERC20::new(token, &self.provider)
            .symbol()
            .call()
            .await
            .map_err(|e| rpc_error(token, "symbol()", e))?;
        let decimals = self.decimals(token).await?;

        Ok(TokenInfo { symbol, decimals })
    }

    async fn pool_state(&self, pool: Address) -> Result<PoolState, MonitorError> {
        let pool_contract = IAlgebraPool::new(pool, &self.provider);

        let token0 = pool_contract
            .token0()
            .call()
            .await
            .map_err(|e| rpc_error(pool, "token0()", e))?;
        let token1 = pool_contract
            .token1()
            .call()
            .await
            .map_err(|e| rpc_error(pool, "token1()", e))?;
        let global_state = pool_contract
            .globalState()
            .call()
            .await
            .map_err(|e| rpc_error(pool, "globalState()", e))?;

        let decimals0 = self.decimals(token0).await?;
        let decimals1 = self.decimals(token1).await?;

        // Not every Algebra deployment exposes liquidity()
        let liquidity = match pool_contract.liquidity().call().await {
            Ok(liquidity) => Some(liquidity),
            Err(e) => {
                warn!("{}: liquidity() not available: {}", pool, e);
                None
            },
        };

        Ok(PoolState {
            address: pool,
            token0,
            token1,
            decimals0,
            decimals1,
            sqrt_price_x96: U256::from(global_state.price),
            liquidity,
        })
    }
}

fn rpc_error(contract: Address, call: &str, e: impl Display) -> MonitorError {
    MonitorError::Rpc(format!("{} on {}: {}", call, contract, e))
}
