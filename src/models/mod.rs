mod observation;
mod pool_state;
mod quote_asset;
mod reference_prices;

pub use observation::{PoolObservation, TokenDecimals};
pub use pool_state::PoolState;
pub use quote_asset::{QuoteAsset, ReferenceAsset};
pub use reference_prices::ReferencePrices;
