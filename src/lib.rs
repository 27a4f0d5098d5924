pub mod abis;
pub mod config;
pub mod errors;
pub mod feed;
pub mod models;
pub mod monitor;
pub mod reader;
pub mod sink;
pub mod utils;

pub use config::Settings;
pub use errors::{ComputationError, MonitorError};
pub use feed::{CoingeckoFeed, PriceFeed};
pub use monitor::{CycleSummary, Monitor};
pub use reader::{ChainReader, RpcReader};
pub use sink::ObservationLog;
