// Venue adapter module
// This file implements the adapter pattern for integrating different venue implementations
// into the aggregator's core logic
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset};
use crate::errors::VenueError;
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Capability kind of a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    /// Single pool per pair; subject to the liquidity guard.
    SimpleAmm,
    /// Several independently quotable fee tiers per pair.
    TieredAmm,
}

impl VenueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VenueKind::SimpleAmm => "simple_amm",
            VenueKind::TieredAmm => "tiered_amm",
        }
    }
}

impl fmt::Display for VenueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform interface over one liquidity source.
///
/// Tiered venues require `tier` on every quote and execute call; simple venues ignore it.
#[async_trait]
pub trait Venue: Send + Sync {
    fn address(&self) -> Address;

    fn kind(&self) -> VenueKind;

    /// Fee tiers offered, in evaluation order. Empty for simple venues.
    fn fee_tiers(&self) -> &[u32];

    /// Predicted output for an exact-input trade, without executing it.
    async fn quote(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        tier: Option<u32>,
    ) -> Result<Amount, VenueError>;

    /// Execute the trade: `amount_in` is taken from `payer`, output is sent to `recipient`.
    async fn execute(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        payer: Address,
        recipient: Address,
        tier: Option<u32>,
    ) -> Result<Amount, VenueError>;

    /// Current reserve of `asset_in` in the pool trading `asset_in -> asset_out`.
    async fn reserve_of(&self, asset_in: Asset, asset_out: Asset) -> Result<Amount, VenueError>;
}

/// Wraps a venue so quoting failures become zero quotes while execution
/// failures keep propagating.
#[derive(Clone)]
pub struct VenueAdapter {
    inner: Arc<dyn Venue>,
}

impl VenueAdapter {
    pub fn new(inner: Arc<dyn Venue>) -> Self {
        Self { inner }
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    pub fn kind(&self) -> VenueKind {
        self.inner.kind()
    }

    pub fn fee_tiers(&self) -> &[u32] {
        self.inner.fee_tiers()
    }

    /// Quote that never fails: a venue error is logged and reported as 0.
    pub async fn quote_or_zero(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        tier: Option<u32>,
    ) -> Amount {
        match self.inner.quote(asset_in, asset_out, amount_in, tier).await {
            Ok(amount_out) => {
                metrics::VENUE_QUOTES
                    .with_label_values(&[self.kind().as_str(), "ok"])
                    .inc();
                amount_out
            }
            Err(err) => {
                metrics::VENUE_QUOTES
                    .with_label_values(&[self.kind().as_str(), "failed"])
                    .inc();
                debug!(
                    venue = %self.address(),
                    asset_in = %asset_in,
                    asset_out = %asset_out,
                    tier = ?tier,
                    error = %err,
                    "venue quote failed; treating as zero"
                );
                Amount::ZERO
            }
        }
    }

    pub async fn execute(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        payer: Address,
        recipient: Address,
        tier: Option<u32>,
    ) -> Result<Amount, VenueError> {
        self.inner
            .execute(asset_in, asset_out, amount_in, payer, recipient, tier)
            .await
    }

    pub async fn reserve_of(&self, asset_in: Asset, asset_out: Asset) -> Result<Amount, VenueError> {
        self.inner.reserve_of(asset_in, asset_out).await
    }
}

impl<V: Venue + 'static> From<Arc<V>> for VenueAdapter {
    fn from(venue: Arc<V>) -> Self {
        Self::new(venue)
    }
}

impl fmt::Debug for VenueAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueAdapter")
            .field("address", &self.address())
            .field("kind", &self.kind())
            .finish()
    }
}
