//! Error types for the monitor.

use thiserror::Error;

/// Failures of the price normalization step.
///
/// Any of these drops the observation for the affected pool; no record is
/// written with an infinite, NaN or unoriented price.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationError {
    #[error("adjusted price is zero, reciprocal is undefined")]
    ZeroPrice,

    #[error("adjusted price is not finite")]
    NonFinite,

    #[error("neither token0 ({token0}) nor token1 ({token1}) matches base token {base}")]
    UnknownOrientation {
        token0: String,
        token1: String,
        base: String,
    },
}

/// Errors surfaced while polling.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("RPC endpoint unreachable: {0}")]
    Connectivity(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Price feed unavailable: {0}")]
    UpstreamFeed(String),

    #[error("Price computation failed: {0}")]
    Computation(#[from] ComputationError),

    #[error("RPC call failed: {0}")]
    Rpc(String),

    #[error("Failed to append observation: {0}")]
    Sink(#[from] std::io::Error),
}
