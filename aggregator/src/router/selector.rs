// Route selector - finds the route with the greatest output
// Enumerates direct quotes on every venue and two-leg routes through each
// configured intermediate asset, filtering simple venues through the liquidity guard
//
// Numan Thabit 2025 Nov

use crate::assets::{Amount, Asset};
use crate::errors::RouterError;
use crate::metrics;
use crate::router::routes::{Quote, Route, RouteLeg, RouteSelection};
use crate::router::validation::LiquidityGuard;
use crate::state::RouterState;
use crate::venues::adapter::{VenueAdapter, VenueKind};
use futures::future::join_all;
use tracing::{debug, info};

/// Stateless route search over a configuration snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteSelector;

impl RouteSelector {
    pub fn new() -> Self {
        Self
    }

    /// Best route for `amount_in` of `asset_in` into `asset_out`.
    ///
    /// Returns [`Quote::none`] when nothing connects the pair.
    pub async fn find_best_route(
        &self,
        state: &RouterState,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> Result<Quote, RouterError> {
        Ok(self
            .evaluate(state, asset_in, asset_out, amount_in)
            .await?
            .best)
    }

    /// Every viable candidate in enumeration order, plus the selected best.
    ///
    /// Enumeration order: direct candidates by venue slot, then two-leg
    /// candidates by intermediate-asset order.
    #[tracing::instrument(skip_all, fields(asset_in = %asset_in, asset_out = %asset_out, amount_in = %amount_in))]
    pub async fn evaluate(
        &self,
        state: &RouterState,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> Result<RouteSelection, RouterError> {
        if asset_in == asset_out {
            return Err(RouterError::InvalidPair(asset_in));
        }
        if amount_in.is_zero() {
            return Err(RouterError::AmountTooSmall);
        }
        let from = state.venue_asset(asset_in);
        let to = state.venue_asset(asset_out);
        if from == to {
            return Err(RouterError::InvalidPair(from));
        }

        let guard = LiquidityGuard::new(state.reserve_guard_multiplier);
        let mut candidates = Vec::new();

        let direct = join_all(
            state
                .venues
                .iter()
                .enumerate()
                .map(|(slot, venue)| self.venue_quote(&guard, slot, venue, from, to, amount_in)),
        )
        .await;
        for (leg, amount_out) in direct.into_iter().flatten() {
            debug!(
                venue = %leg.venue,
                tier = ?leg.tier,
                amount_out = %amount_out,
                "direct candidate"
            );
            candidates.push(Quote {
                amount_out,
                route: Route::try_new(vec![leg]).unwrap_or_default(),
            });
        }

        for &hop in &state.intermediate_assets {
            let mid = state.venue_asset(hop);
            if mid == from || mid == to {
                continue;
            }
            let Some((first, amount_mid)) = self.best_leg(state, &guard, from, mid, amount_in).await
            else {
                continue;
            };
            let Some((second, amount_out)) =
                self.best_leg(state, &guard, mid, to, amount_mid).await
            else {
                continue;
            };
            debug!(
                via = %mid,
                amount_mid = %amount_mid,
                amount_out = %amount_out,
                "multi-hop candidate"
            );
            if let Some(route) = Route::try_new(vec![first, second]) {
                candidates.push(Quote { amount_out, route });
            }
        }

        let selection = RouteSelection::from_candidates(candidates);
        if selection.best.is_viable() {
            metrics::ROUTE_SEARCHES.with_label_values(&["found"]).inc();
            info!(
                amount_out = %selection.best.amount_out,
                hops = selection.best.route.legs().len(),
                candidates = selection.candidates.len(),
                "selected best route"
            );
        } else {
            metrics::ROUTE_SEARCHES.with_label_values(&["none"]).inc();
            info!("no viable route");
        }
        Ok(selection)
    }

    /// Best single leg for `asset_in -> asset_out` across all venues.
    async fn best_leg(
        &self,
        state: &RouterState,
        guard: &LiquidityGuard,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> Option<(RouteLeg, Amount)> {
        let quotes = join_all(
            state
                .venues
                .iter()
                .enumerate()
                .map(|(slot, venue)| self.venue_quote(guard, slot, venue, asset_in, asset_out, amount_in)),
        )
        .await;
        quotes
            .into_iter()
            .flatten()
            .fold(None, |best: Option<(RouteLeg, Amount)>, (leg, out)| match best {
                Some((_, current)) if out <= current => best,
                _ => Some((leg, out)),
            })
    }

    /// Non-zero quote from one venue: the guarded quote for simple venues,
    /// the best tier for tiered venues.
    async fn venue_quote(
        &self,
        guard: &LiquidityGuard,
        slot: usize,
        venue: &VenueAdapter,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> Option<(RouteLeg, Amount)> {
        let (tier, amount_out) = match venue.kind() {
            VenueKind::SimpleAmm => {
                let amount_out = venue.quote_or_zero(asset_in, asset_out, amount_in, None).await;
                if amount_out.is_zero() {
                    return None;
                }
                if !guard
                    .check(venue, asset_in, asset_out, amount_in)
                    .await
                    .allows()
                {
                    return None;
                }
                (None, amount_out)
            }
            VenueKind::TieredAmm => {
                let mut best: Option<(u32, Amount)> = None;
                for &tier in venue.fee_tiers() {
                    let out = venue
                        .quote_or_zero(asset_in, asset_out, amount_in, Some(tier))
                        .await;
                    if out > best.map_or(Amount::ZERO, |(_, current)| current) {
                        best = Some((tier, out));
                    }
                }
                let (tier, amount_out) = best?;
                (Some(tier), amount_out)
            }
        };

        Some((
            RouteLeg {
                venue_slot: slot,
                venue: venue.address(),
                tier,
                asset_in,
                asset_out,
            },
            amount_out,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NATIVE;
    use crate::router::validation::GUARD_SCALE;
    use crate::testing::{addr, amount, router_state, ScriptedVenue};
    use std::sync::Arc;

    const DAI: u64 = 1;
    const UNI: u64 = 2;
    const WETH: u64 = 100;
    const USDC: u64 = 101;

    fn three_venues() -> (Arc<ScriptedVenue>, Arc<ScriptedVenue>, Arc<ScriptedVenue>) {
        (
            Arc::new(ScriptedVenue::simple(addr(900))),
            Arc::new(ScriptedVenue::simple(addr(901))),
            Arc::new(ScriptedVenue::tiered(addr(910), vec![500, 3_000, 10_000])),
        )
    }

    #[tokio::test]
    async fn test_single_direct_pool_selected() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(UNI), None, 1, 1);
        let state = router_state(vec![v1, v2, v3], vec![addr(WETH)]);

        let quote = RouteSelector::new()
            .find_best_route(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();

        assert_eq!(quote.amount_out, amount(1_000));
        assert_eq!(quote.route.path(), vec![addr(DAI), addr(UNI)]);
        assert_eq!(quote.route.legs()[0].venue, addr(900));
        assert_eq!(quote.route.legs()[0].tier, None);
    }

    #[tokio::test]
    async fn test_switches_to_better_tier() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(UNI), None, 1, 1);
        let state = router_state(vec![v1, v2, v3.clone()], vec![]);
        let selector = RouteSelector::new();

        let before = selector
            .find_best_route(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();
        assert_eq!(before.route.legs()[0].venue, addr(900));

        v3.set_rate(addr(DAI), addr(UNI), Some(500), 3, 2);
        v3.set_rate(addr(DAI), addr(UNI), Some(3_000), 2, 1);
        let after = selector
            .find_best_route(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();

        assert_eq!(after.amount_out, amount(2_000));
        assert_eq!(after.route.legs()[0].venue, addr(910));
        assert_eq!(after.route.legs()[0].tier, Some(3_000));
    }

    #[tokio::test]
    async fn test_unconnected_pair_returns_empty_quote() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(WETH), None, 1, 1);
        let state = router_state(vec![v1, v2, v3], vec![addr(WETH)]);

        let quote = RouteSelector::new()
            .find_best_route(&state, addr(7), addr(8), amount(1_000))
            .await
            .unwrap();

        assert_eq!(quote, Quote::none());
    }

    #[tokio::test]
    async fn test_invalid_inputs() {
        let (v1, v2, v3) = three_venues();
        let state = router_state(vec![v1, v2, v3], vec![]);
        let selector = RouteSelector::new();

        assert!(matches!(
            selector.find_best_route(&state, addr(DAI), addr(DAI), amount(1_000)).await,
            Err(RouterError::InvalidPair(_))
        ));
        assert!(matches!(
            selector.find_best_route(&state, addr(DAI), addr(DAI), amount(0)).await,
            Err(RouterError::InvalidPair(_))
        ));
        assert!(matches!(
            selector.find_best_route(&state, addr(DAI), addr(UNI), amount(0)).await,
            Err(RouterError::AmountTooSmall)
        ));
        // Native and its wrapped form collapse to the same venue asset.
        assert!(matches!(
            selector.find_best_route(&state, NATIVE, addr(WETH), amount(10)).await,
            Err(RouterError::InvalidPair(_))
        ));
    }

    #[tokio::test]
    async fn test_multi_hop_beats_direct() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(UNI), None, 1, 1);
        v1.set_rate(addr(DAI), addr(WETH), None, 2, 1);
        v2.set_rate(addr(WETH), addr(UNI), None, 1, 1);
        v2.set_rate(addr(DAI), addr(WETH), None, 3, 1);
        let state = router_state(vec![v1, v2, v3], vec![addr(WETH)]);

        let selection = RouteSelector::new()
            .evaluate(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();

        assert_eq!(selection.candidates.len(), 2);
        let best = selection.best;
        assert_eq!(best.amount_out, amount(3_000));
        assert_eq!(best.route.path(), vec![addr(DAI), addr(WETH), addr(UNI)]);
        assert_eq!(best.route.legs()[0].venue, addr(901));
        assert_eq!(best.route.legs()[1].venue, addr(901));
    }

    #[tokio::test]
    async fn test_broken_hop_is_discarded() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(UNI), None, 1, 2);
        // First leg exists, second leg does not.
        v2.set_rate(addr(DAI), addr(USDC), None, 5, 1);
        let state = router_state(vec![v1, v2, v3], vec![addr(USDC), addr(WETH)]);

        let selection = RouteSelector::new()
            .evaluate(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();

        assert_eq!(selection.candidates.len(), 1);
        assert_eq!(selection.best.amount_out, amount(500));
    }

    #[tokio::test]
    async fn test_intermediate_equal_to_endpoint_is_skipped() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(UNI), None, 1, 1);
        let state = router_state(vec![v1, v2, v3], vec![addr(DAI), addr(UNI)]);

        let selection = RouteSelector::new()
            .evaluate(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();

        assert_eq!(selection.candidates.len(), 1);
        assert!(selection.best.route.is_direct());
    }

    #[tokio::test]
    async fn test_guard_excludes_thin_simple_venue() {
        let v1 = Arc::new(
            ScriptedVenue::simple(addr(900))
                .with_rate(addr(DAI), addr(UNI), None, 2, 1)
                .with_reserve(addr(DAI), addr(UNI), amount(1_500)),
        );
        let v2 = Arc::new(ScriptedVenue::simple(addr(901)).with_rate(addr(DAI), addr(UNI), None, 1, 1));
        let mut state = router_state(vec![v1, v2], vec![]);
        let selector = RouteSelector::new();

        // Default multiplier admits up to half the reserve: 1_000 > 750.
        let quote = selector
            .find_best_route(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();
        assert_eq!(quote.route.legs()[0].venue, addr(901));

        state.reserve_guard_multiplier = GUARD_SCALE;
        let quote = selector
            .find_best_route(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();
        assert_eq!(quote.route.legs()[0].venue, addr(900));
        assert_eq!(quote.amount_out, amount(2_000));
    }

    #[tokio::test]
    async fn test_ties_go_to_earliest_candidate() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(UNI), None, 1, 1);
        v2.set_rate(addr(DAI), addr(UNI), None, 1, 1);
        v3.set_rate(addr(DAI), addr(UNI), Some(500), 1, 1);
        v3.set_rate(addr(DAI), addr(UNI), Some(3_000), 1, 1);
        // Two-leg route with the same output.
        v2.set_rate(addr(DAI), addr(WETH), None, 1, 1);
        v2.set_rate(addr(WETH), addr(UNI), None, 1, 1);
        let state = router_state(vec![v1, v2, v3], vec![addr(WETH)]);

        let selection = RouteSelector::new()
            .evaluate(&state, addr(DAI), addr(UNI), amount(1_000))
            .await
            .unwrap();

        assert_eq!(selection.candidates.len(), 4);
        assert_eq!(selection.best.route.legs()[0].venue, addr(900));
        let tiered = &selection.candidates[2];
        assert_eq!(tiered.route.legs()[0].tier, Some(500));
    }

    #[tokio::test]
    async fn test_native_input_routes_through_wrapped() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(WETH), addr(UNI), None, 4, 1);
        let state = router_state(vec![v1, v2, v3], vec![]);

        let quote = RouteSelector::new()
            .find_best_route(&state, NATIVE, addr(UNI), amount(10))
            .await
            .unwrap();

        assert_eq!(quote.amount_out, amount(40));
        assert_eq!(quote.route.path(), vec![addr(WETH), addr(UNI)]);
    }

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let (v1, v2, v3) = three_venues();
        v1.set_rate(addr(DAI), addr(WETH), None, 2, 1);
        v2.set_rate(addr(WETH), addr(UNI), None, 1, 1);
        v3.set_rate(addr(DAI), addr(UNI), Some(10_000), 3, 2);
        let state = router_state(vec![v1, v2, v3], vec![addr(WETH)]);
        let selector = RouteSelector::new();

        let first = selector
            .find_best_route(&state, addr(DAI), addr(UNI), amount(777))
            .await
            .unwrap();
        for _ in 0..5 {
            let again = selector
                .find_best_route(&state, addr(DAI), addr(UNI), amount(777))
                .await
                .unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(first.amount_out, amount(1_554));
    }
}
