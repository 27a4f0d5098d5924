use super::{QuoteAsset, ReferenceAsset};

/// USD quotes fetched once per cycle and shared by every pool evaluated in it.
///
/// A quote the feed could not provide is `None`; there is no sentinel value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReferencePrices {
    pub eth_usd: Option<f64>,
    pub pol_usd: Option<f64>,
}

impl ReferencePrices {
    pub fn new(eth_usd: Option<f64>, pol_usd: Option<f64>) -> Self {
        Self { eth_usd, pol_usd }
    }

    pub fn get(&self, asset: ReferenceAsset) -> Option<f64> {
        match asset {
            ReferenceAsset::Eth => self.eth_usd,
            ReferenceAsset::Pol => self.pol_usd,
        }
    }

    /// The quote recorded with a pool priced against `quote`.
    pub fn for_quote(&self, quote: QuoteAsset) -> Option<f64> {
        quote.reference_asset().and_then(|asset| self.get(asset))
    }
}
