// Control plane: owner-gated configuration updates
//
// Every setter checks the caller against the owner, rejects updates that
// leave the value unchanged, then publishes a change notification.
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Asset};
use crate::errors::RouterError;
use crate::state::{ConfigEvent, RouterState, SharedState};
use crate::venues::adapter::{Venue, VenueAdapter};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ControlPlane {
    state: SharedState,
}

impl ControlPlane {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Replace the venue in `slot`. Identity is the venue address.
    pub async fn set_venue(
        &self,
        caller: Address,
        slot: usize,
        venue: Arc<dyn Venue>,
    ) -> Result<ConfigEvent, RouterError> {
        let mut state = self.state.inner().write().await;
        ensure_owner(&state, caller)?;
        let current = state
            .venues
            .get(slot)
            .ok_or(RouterError::UnknownVenueSlot(slot))?;
        let old = current.address();
        let new = venue.address();
        if old == new {
            return Err(RouterError::NoOpUpdate("venue"));
        }
        state.venues[slot] = VenueAdapter::new(venue);
        drop(state);

        info!(slot = slot, old = %old, new = %new, "venue updated");
        Ok(self.emit(ConfigEvent::VenueUpdated { slot, old, new }))
    }

    /// Wholesale replacement of the hop candidate list.
    pub async fn set_intermediate_assets(
        &self,
        caller: Address,
        assets: Vec<Asset>,
    ) -> Result<ConfigEvent, RouterError> {
        let mut state = self.state.inner().write().await;
        ensure_owner(&state, caller)?;
        if state.intermediate_assets == assets {
            return Err(RouterError::NoOpUpdate("intermediate assets"));
        }
        let old = std::mem::replace(&mut state.intermediate_assets, assets.clone());
        drop(state);

        info!(old = ?old, new = ?assets, "intermediate assets updated");
        Ok(self.emit(ConfigEvent::IntermediateAssetsUpdated { old, new: assets }))
    }

    pub async fn set_reserve_guard_multiplier(
        &self,
        caller: Address,
        multiplier: u128,
    ) -> Result<ConfigEvent, RouterError> {
        let mut state = self.state.inner().write().await;
        ensure_owner(&state, caller)?;
        let old = state.reserve_guard_multiplier;
        if old == multiplier {
            return Err(RouterError::NoOpUpdate("reserve guard multiplier"));
        }
        state.reserve_guard_multiplier = multiplier;
        drop(state);

        info!(old = old, new = multiplier, "reserve guard multiplier updated");
        Ok(self.emit(ConfigEvent::ReserveGuardMultiplierUpdated {
            old,
            new: multiplier,
        }))
    }

    fn emit(&self, event: ConfigEvent) -> ConfigEvent {
        self.state.publish(event.clone());
        event
    }
}

fn ensure_owner(state: &RouterState, caller: Address) -> Result<(), RouterError> {
    if caller == state.owner {
        Ok(())
    } else {
        Err(RouterError::Unauthorized(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, ScriptedVenue};

    const OWNER: u64 = 1;

    fn shared_state() -> SharedState {
        let venues = vec![
            VenueAdapter::new(Arc::new(ScriptedVenue::simple(addr(900)))),
            VenueAdapter::new(Arc::new(ScriptedVenue::tiered(addr(910), vec![500]))),
        ];
        SharedState::new(
            RouterState {
                owner: addr(OWNER),
                router_account: addr(2),
                wrapped_native: addr(100),
                venues,
                intermediate_assets: vec![addr(100)],
                reserve_guard_multiplier: 20_000,
            },
            16,
        )
    }

    #[tokio::test]
    async fn test_multiplier_update_and_noop() {
        let state = shared_state();
        let control = ControlPlane::new(state.clone());

        let err = control
            .set_reserve_guard_multiplier(addr(OWNER), 20_000)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoOpUpdate(_)));

        let event = control
            .set_reserve_guard_multiplier(addr(OWNER), 50_000)
            .await
            .unwrap();
        assert_eq!(
            event,
            ConfigEvent::ReserveGuardMultiplierUpdated {
                old: 20_000,
                new: 50_000
            }
        );
        assert_eq!(state.snapshot().await.reserve_guard_multiplier, 50_000);
    }

    #[tokio::test]
    async fn test_non_owner_rejected_before_noop_check() {
        let control = ControlPlane::new(shared_state());

        let err = control
            .set_reserve_guard_multiplier(addr(99), 20_000)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::Unauthorized(a) if a == addr(99)));

        let err = control
            .set_intermediate_assets(addr(99), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_intermediate_assets_replaced_wholesale() {
        let state = shared_state();
        let control = ControlPlane::new(state.clone());

        let err = control
            .set_intermediate_assets(addr(OWNER), vec![addr(100)])
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoOpUpdate(_)));

        control
            .set_intermediate_assets(addr(OWNER), vec![addr(101), addr(102)])
            .await
            .unwrap();
        assert_eq!(
            state.snapshot().await.intermediate_assets,
            vec![addr(101), addr(102)]
        );
    }

    #[tokio::test]
    async fn test_set_venue_by_slot() {
        let state = shared_state();
        let control = ControlPlane::new(state.clone());

        let err = control
            .set_venue(addr(OWNER), 0, Arc::new(ScriptedVenue::simple(addr(900))))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoOpUpdate(_)));

        let err = control
            .set_venue(addr(OWNER), 5, Arc::new(ScriptedVenue::simple(addr(905))))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::UnknownVenueSlot(5)));

        control
            .set_venue(addr(OWNER), 0, Arc::new(ScriptedVenue::simple(addr(901))))
            .await
            .unwrap();
        assert_eq!(state.snapshot().await.venues[0].address(), addr(901));
    }

    #[tokio::test]
    async fn test_updates_are_broadcast() {
        let state = shared_state();
        let mut rx = state.subscribe();
        let control = ControlPlane::new(state);

        control
            .set_intermediate_assets(addr(OWNER), vec![addr(7)])
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            ConfigEvent::IntermediateAssetsUpdated {
                old: vec![addr(100)],
                new: vec![addr(7)]
            }
        );
    }
}
