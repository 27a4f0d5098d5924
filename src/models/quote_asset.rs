use serde::Serialize;

/// Asset the monitored token is priced against in a given pool.
///
/// Pools are evaluated in the order of [`QuoteAsset::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteAsset {
    Usdc,
    Eth,
    Pol,
}

impl QuoteAsset {
    pub const ALL: [QuoteAsset; 3] = [QuoteAsset::Usdc, QuoteAsset::Eth, QuoteAsset::Pol];

    pub fn symbol(&self) -> &'static str {
        match self {
            QuoteAsset::Usdc => "USDC",
            QuoteAsset::Eth => "ETH",
            QuoteAsset::Pol => "POL",
        }
    }

    /// Pair label such as `SHT/USDC`.
    pub fn pair_label(&self, base_symbol: &str) -> String {
        format!("{}/{}", base_symbol, self.symbol())
    }

    /// USD reference quote recorded alongside this pool's observations.
    /// USDC pools carry none.
    pub fn reference_asset(&self) -> Option<ReferenceAsset> {
        match self {
            QuoteAsset::Usdc => None,
            QuoteAsset::Eth => Some(ReferenceAsset::Eth),
            QuoteAsset::Pol => Some(ReferenceAsset::Pol),
        }
    }
}

/// Assets whose USD price is fetched from the external feed every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceAsset {
    Eth,
    /// Polygon's native gas token
    Pol,
}

impl ReferenceAsset {
    pub fn symbol(&self) -> &'static str {
        match self {
            ReferenceAsset::Eth => "ETH",
            ReferenceAsset::Pol => "POL",
        }
    }

    /// CoinGecko asset id
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            ReferenceAsset::Eth => "ethereum",
            ReferenceAsset::Pol => "polygon-ecosystem-token",
        }
    }
}
