// Liquidity guard
// Rejects simple-AMM quotes whose input is large relative to the pool's
// reserve of the input asset
//
// Numan Thabit 2025 Nov

use crate::assets::{Amount, Asset, U256};
use crate::metrics;
use crate::venues::adapter::{VenueAdapter, VenueKind};
use tracing::debug;

/// The multiplier is expressed against this scale: a multiplier equal to
/// `GUARD_SCALE` admits inputs up to the whole reserve, `2 * GUARD_SCALE`
/// up to half of it.
pub const GUARD_SCALE: u128 = 10_000;

/// Default multiplier: inputs up to half the reserve pass.
pub const DEFAULT_RESERVE_GUARD_MULTIPLIER: u128 = 2 * GUARD_SCALE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Passed,
    /// Tiered venues price depth into their own quotes.
    Skipped,
    Rejected { reserve_in: Option<Amount> },
}

impl GuardDecision {
    pub fn allows(&self) -> bool {
        !matches!(self, GuardDecision::Rejected { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LiquidityGuard {
    multiplier: u128,
}

impl LiquidityGuard {
    pub fn new(multiplier: u128) -> Self {
        Self { multiplier }
    }

    pub fn multiplier(&self) -> u128 {
        self.multiplier
    }

    /// `amount_in * multiplier <= reserve_in * GUARD_SCALE`, overflow on the
    /// left side rejects.
    pub fn permits(&self, amount_in: Amount, reserve_in: Amount) -> bool {
        match amount_in.checked_mul(U256::from(self.multiplier)) {
            Some(scaled) => scaled <= reserve_in.saturating_mul(U256::from(GUARD_SCALE)),
            None => false,
        }
    }

    /// Evaluate a venue for one trade. A reserve lookup failure rejects.
    pub async fn check(
        &self,
        venue: &VenueAdapter,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> GuardDecision {
        if venue.kind() == VenueKind::TieredAmm {
            return GuardDecision::Skipped;
        }

        let decision = match venue.reserve_of(asset_in, asset_out).await {
            Ok(reserve_in) if self.permits(amount_in, reserve_in) => GuardDecision::Passed,
            Ok(reserve_in) => GuardDecision::Rejected {
                reserve_in: Some(reserve_in),
            },
            Err(err) => {
                debug!(venue = %venue.address(), error = %err, "reserve lookup failed");
                GuardDecision::Rejected { reserve_in: None }
            }
        };

        if let GuardDecision::Rejected { reserve_in } = decision {
            metrics::GUARD_REJECTIONS.inc();
            debug!(
                venue = %venue.address(),
                asset_in = %asset_in,
                amount_in = %amount_in,
                reserve_in = ?reserve_in,
                multiplier = self.multiplier,
                "liquidity guard rejected venue"
            );
        }
        decision
    }
}
