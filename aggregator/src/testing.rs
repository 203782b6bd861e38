// Test fixtures shared across module tests
// Scripted venues with fixed exchange rates and failure switches, plus a
// small in-memory world builder for router-level tests
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset, U256};
use crate::errors::VenueError;
use crate::ledger::{AssetLedger, InMemoryLedger};
use crate::router::validation::DEFAULT_RESERVE_GUARD_MULTIPLIER;
use crate::state::RouterState;
use crate::venues::adapter::{Venue, VenueAdapter, VenueKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Reserve reported for scripted pairs without an explicit reserve (2^128).
pub const DEEP_RESERVE: Amount = U256::from_limbs([0, 0, 1, 0]);

pub const TEST_OWNER: Address = addr(5_000);
pub const TEST_ROUTER: Address = addr(5_001);
pub const TEST_WETH: Address = addr(100);

/// Address with `n` in its low eight bytes.
pub const fn addr(n: u64) -> Address {
    let mut bytes = [0u8; 20];
    let be = n.to_be_bytes();
    let mut i = 0;
    while i < 8 {
        bytes[12 + i] = be[i];
        i += 1;
    }
    Address::new(bytes)
}

pub fn amount(n: u64) -> Amount {
    U256::from(n)
}

/// `n` whole tokens of an 18-decimal asset.
pub fn ether(n: u64) -> Amount {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// Configuration with the test owner, router account and wrapped native asset.
pub fn router_state<I>(venues: I, intermediate_assets: Vec<Asset>) -> RouterState
where
    I: IntoIterator,
    I::Item: Into<VenueAdapter>,
{
    RouterState {
        owner: TEST_OWNER,
        router_account: TEST_ROUTER,
        wrapped_native: TEST_WETH,
        venues: venues.into_iter().map(Into::into).collect(),
        intermediate_assets,
        reserve_guard_multiplier: DEFAULT_RESERVE_GUARD_MULTIPLIER,
    }
}

type PairKey = (Asset, Asset, Option<u32>);

/// Venue returning `amount_in * num / den` for scripted pairs.
pub struct ScriptedVenue {
    address: Address,
    kind: VenueKind,
    tiers: Vec<u32>,
    rates: Mutex<HashMap<PairKey, (Amount, Amount)>>,
    reserves: Mutex<HashMap<(Asset, Asset), Amount>>,
    /// Output paid on execution, in basis points of the quoted output.
    execution_bps: Mutex<u64>,
    fail_execution: AtomicBool,
    ledger: Option<Arc<InMemoryLedger>>,
}

impl ScriptedVenue {
    pub fn simple(address: Address) -> Self {
        Self::new(address, VenueKind::SimpleAmm, Vec::new())
    }

    pub fn tiered(address: Address, tiers: Vec<u32>) -> Self {
        Self::new(address, VenueKind::TieredAmm, tiers)
    }

    fn new(address: Address, kind: VenueKind, tiers: Vec<u32>) -> Self {
        Self {
            address,
            kind,
            tiers,
            rates: Mutex::new(HashMap::new()),
            reserves: Mutex::new(HashMap::new()),
            execution_bps: Mutex::new(10_000),
            fail_execution: AtomicBool::new(false),
            ledger: None,
        }
    }

    /// Settle executions through `ledger`; the venue pays out of its own balance.
    pub fn with_ledger(mut self, ledger: Arc<InMemoryLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_rate(self, asset_in: Asset, asset_out: Asset, tier: Option<u32>, num: u64, den: u64) -> Self {
        self.set_rate(asset_in, asset_out, tier, num, den);
        self
    }

    pub fn with_reserve(self, asset_in: Asset, asset_out: Asset, reserve: Amount) -> Self {
        self.reserves
            .lock()
            .unwrap()
            .insert((asset_in, asset_out), reserve);
        self
    }

    pub fn failing_execution(self) -> Self {
        self.fail_execution.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_rate(&self, asset_in: Asset, asset_out: Asset, tier: Option<u32>, num: u64, den: u64) {
        self.rates
            .lock()
            .unwrap()
            .insert((asset_in, asset_out, tier), (U256::from(num), U256::from(den)));
    }

    pub fn set_execution_bps(&self, bps: u64) {
        *self.execution_bps.lock().unwrap() = bps;
    }

    fn rate(&self, asset_in: Asset, asset_out: Asset, tier: Option<u32>) -> Result<(Amount, Amount), VenueError> {
        match self.kind {
            VenueKind::TieredAmm => {
                let tier = tier.ok_or(VenueError::TierRequired)?;
                if !self.tiers.contains(&tier) {
                    return Err(VenueError::UnsupportedTier(tier));
                }
            }
            VenueKind::SimpleAmm => {}
        }
        let key_tier = match self.kind {
            VenueKind::SimpleAmm => None,
            VenueKind::TieredAmm => tier,
        };
        self.rates
            .lock()
            .unwrap()
            .get(&(asset_in, asset_out, key_tier))
            .copied()
            .ok_or(VenueError::NoPool { asset_in, asset_out })
    }
}

#[async_trait]
impl Venue for ScriptedVenue {
    fn address(&self) -> Address {
        self.address
    }

    fn kind(&self) -> VenueKind {
        self.kind
    }

    fn fee_tiers(&self) -> &[u32] {
        &self.tiers
    }

    async fn quote(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        tier: Option<u32>,
    ) -> Result<Amount, VenueError> {
        let (num, den) = self.rate(asset_in, asset_out, tier)?;
        amount_in
            .checked_mul(num)
            .map(|v| v / den)
            .ok_or(VenueError::Overflow)
    }

    async fn execute(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        payer: Address,
        recipient: Address,
        tier: Option<u32>,
    ) -> Result<Amount, VenueError> {
        if self.fail_execution.load(Ordering::SeqCst) {
            return Err(VenueError::Reverted("scripted execution failure".into()));
        }
        let quoted = self.quote(asset_in, asset_out, amount_in, tier).await?;
        let bps = *self.execution_bps.lock().unwrap();
        let amount_out = quoted * U256::from(bps) / U256::from(10_000u64);
        if let Some(ledger) = &self.ledger {
            ledger.transfer(asset_in, payer, self.address, amount_in).await?;
            ledger.transfer(asset_out, self.address, recipient, amount_out).await?;
        }
        Ok(amount_out)
    }

    async fn reserve_of(&self, asset_in: Asset, asset_out: Asset) -> Result<Amount, VenueError> {
        Ok(self
            .reserves
            .lock()
            .unwrap()
            .get(&(asset_in, asset_out))
            .copied()
            .unwrap_or(DEEP_RESERVE))
    }
}
