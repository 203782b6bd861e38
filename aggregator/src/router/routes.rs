// Route types
// This file defines route legs, routes, quotes and the selection result
// produced by the route selector
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset};
use serde::Serialize;

/// One hop executed on a single venue (and fee tier, for tiered venues).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteLeg {
    /// Index of the venue in the configured venue list.
    pub venue_slot: usize,
    pub venue: Address,
    pub tier: Option<u32>,
    pub asset_in: Asset,
    pub asset_out: Asset,
}

/// Ordered legs where each leg's output asset feeds the next leg's input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Route {
    legs: Vec<RouteLeg>,
}

impl Route {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a route if legs are non-empty and contiguous.
    pub fn try_new(legs: Vec<RouteLeg>) -> Option<Self> {
        if legs.is_empty() || !Self::is_continuous(&legs) {
            return None;
        }
        Some(Self { legs })
    }

    pub fn is_continuous(legs: &[RouteLeg]) -> bool {
        legs.windows(2).all(|pair| pair[0].asset_out == pair[1].asset_in)
    }

    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn is_direct(&self) -> bool {
        self.legs.len() == 1
    }

    /// Hop path: input asset of the first leg followed by every leg's output.
    pub fn path(&self) -> Vec<Asset> {
        let mut path = Vec::with_capacity(self.legs.len() + 1);
        if let Some(first) = self.legs.first() {
            path.push(first.asset_in);
        }
        path.extend(self.legs.iter().map(|leg| leg.asset_out));
        path
    }
}

/// Predicted output along a route. Zero output with an empty route means
/// no viable route exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Quote {
    pub amount_out: Amount,
    pub route: Route,
}

impl Quote {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_viable(&self) -> bool {
        !self.amount_out.is_zero() && !self.route.is_empty()
    }
}

/// Best quote plus every viable candidate, in enumeration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteSelection {
    pub best: Quote,
    pub candidates: Vec<Quote>,
}

impl RouteSelection {
    /// Pick the strictly greatest output; the earliest candidate wins ties.
    pub fn from_candidates(candidates: Vec<Quote>) -> Self {
        let best = candidates
            .iter()
            .fold(None::<&Quote>, |best, candidate| match best {
                Some(current) if candidate.amount_out <= current.amount_out => Some(current),
                _ => Some(candidate),
            })
            .cloned()
            .unwrap_or_default();
        Self { best, candidates }
    }
}
