// Router configuration state
//
// Holds the venue table, the intermediate-asset list and the reserve guard
// multiplier. Readers take a cloned snapshot per call; changes are broadcast
// to subscribers.
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Asset, AssetExt};
use crate::venues::adapter::{VenueAdapter, VenueKind};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Everything the selector, guard and executor read on each call.
#[derive(Debug, Clone)]
pub struct RouterState {
    pub owner: Address,
    /// Account that holds assets in flight during a swap.
    pub router_account: Address,
    pub wrapped_native: Asset,
    /// Venue slots in enumeration order.
    pub venues: Vec<VenueAdapter>,
    pub intermediate_assets: Vec<Asset>,
    pub reserve_guard_multiplier: u128,
}

impl RouterState {
    /// Substitute the native pseudo-asset with its wrapped form.
    pub fn venue_asset(&self, asset: Asset) -> Asset {
        if asset.is_native() {
            self.wrapped_native
        } else {
            asset
        }
    }

    pub fn view(&self) -> ConfigView {
        ConfigView {
            owner: self.owner,
            router_account: self.router_account,
            wrapped_native: self.wrapped_native,
            venues: self
                .venues
                .iter()
                .enumerate()
                .map(|(slot, venue)| VenueView {
                    slot,
                    address: venue.address(),
                    kind: venue.kind(),
                    fee_tiers: venue.fee_tiers().to_vec(),
                })
                .collect(),
            intermediate_assets: self.intermediate_assets.clone(),
            reserve_guard_multiplier: self.reserve_guard_multiplier,
        }
    }
}

/// Change notification emitted by every successful admin setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConfigEvent {
    VenueUpdated {
        slot: usize,
        old: Address,
        new: Address,
    },
    IntermediateAssetsUpdated {
        old: Vec<Asset>,
        new: Vec<Asset>,
    },
    ReserveGuardMultiplierUpdated {
        old: u128,
        new: u128,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueView {
    pub slot: usize,
    pub address: Address,
    pub kind: VenueKind,
    pub fee_tiers: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    pub owner: Address,
    pub router_account: Address,
    pub wrapped_native: Asset,
    pub venues: Vec<VenueView>,
    pub intermediate_assets: Vec<Asset>,
    pub reserve_guard_multiplier: u128,
}

#[derive(Clone)]
pub struct SharedState {
    inner: Arc<RwLock<RouterState>>,
    tx: broadcast::Sender<ConfigEvent>,
}

impl SharedState {
    pub fn new(state: RouterState, buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            inner: Arc::new(RwLock::new(state)),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.tx.subscribe()
    }

    /// Current configuration, copied so a call sees one consistent version.
    pub async fn snapshot(&self) -> RouterState {
        self.inner.read().await.clone()
    }

    pub(crate) fn inner(&self) -> &RwLock<RouterState> {
        &self.inner
    }

    pub(crate) fn publish(&self, event: ConfigEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}
