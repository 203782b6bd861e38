// Tiered AMM venue adapter
// Each asset pair may have one pool per fee tier; callers quote and
// execute against an explicit tier
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset};
use crate::errors::VenueError;
use crate::ledger::AssetLedger;
use crate::venues::adapter::{Venue, VenueKind};
use crate::venues::amm::{pair_key, Pool};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub struct TieredVenue {
    address: Address,
    tiers: Vec<u32>,
    ledger: Arc<dyn AssetLedger>,
    pools: RwLock<HashMap<(Asset, Asset, u32), Pool>>,
}

impl TieredVenue {
    pub fn new(address: Address, tiers: Vec<u32>, ledger: Arc<dyn AssetLedger>) -> Self {
        Self {
            address,
            tiers,
            ledger,
            pools: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_pool(
        &self,
        asset_a: Asset,
        asset_b: Asset,
        tier: u32,
        account: Address,
    ) -> Result<(), VenueError> {
        self.check_tier(tier)?;
        if asset_a == asset_b {
            return Err(VenueError::Reverted("identical pool assets".into()));
        }
        let (lo, hi) = pair_key(asset_a, asset_b);
        let mut pools = self.pools.write().await;
        if pools.contains_key(&(lo, hi, tier)) {
            return Err(VenueError::Reverted(format!(
                "pool {asset_a}/{asset_b} at tier {tier} already exists"
            )));
        }
        pools.insert(
            (lo, hi, tier),
            Pool {
                account,
                fee_ppm: tier,
            },
        );
        info!(
            venue = %self.address,
            pool = %account,
            tier = tier,
            asset_a = %asset_a,
            asset_b = %asset_b,
            "tiered pool created"
        );
        Ok(())
    }

    pub async fn add_liquidity(
        &self,
        tier: u32,
        provider: Address,
        side_a: (Asset, Amount),
        side_b: (Asset, Amount),
    ) -> Result<(), VenueError> {
        let pool = self.pool(side_a.0, side_b.0, Some(tier)).await?;
        pool.deposit(self.ledger.as_ref(), provider, side_a, side_b)
            .await
    }

    fn check_tier(&self, tier: u32) -> Result<(), VenueError> {
        if self.tiers.contains(&tier) {
            Ok(())
        } else {
            Err(VenueError::UnsupportedTier(tier))
        }
    }

    async fn pool(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        tier: Option<u32>,
    ) -> Result<Pool, VenueError> {
        let tier = tier.ok_or(VenueError::TierRequired)?;
        self.check_tier(tier)?;
        let (lo, hi) = pair_key(asset_in, asset_out);
        self.pools
            .read()
            .await
            .get(&(lo, hi, tier))
            .copied()
            .ok_or(VenueError::NoPool {
                asset_in,
                asset_out,
            })
    }
}

#[async_trait]
impl Venue for TieredVenue {
    fn address(&self) -> Address {
        self.address
    }

    fn kind(&self) -> VenueKind {
        VenueKind::TieredAmm
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
        let pool = self.pool(asset_in, asset_out, tier).await?;
        pool.quote(self.ledger.as_ref(), asset_in, asset_out, amount_in)
            .await
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
        let pool = self.pool(asset_in, asset_out, tier).await?;
        pool.swap(
            self.ledger.as_ref(),
            asset_in,
            asset_out,
            amount_in,
            payer,
            recipient,
        )
        .await
    }

    /// Combined `asset_in` reserve across every tier's pool for the pair.
    async fn reserve_of(&self, asset_in: Asset, asset_out: Asset) -> Result<Amount, VenueError> {
        let (lo, hi) = pair_key(asset_in, asset_out);
        let accounts: Vec<Address> = self
            .pools
            .read()
            .await
            .iter()
            .filter(|((a, b, _), _)| *a == lo && *b == hi)
            .map(|(_, pool)| pool.account)
            .collect();
        if accounts.is_empty() {
            return Err(VenueError::NoPool {
                asset_in,
                asset_out,
            });
        }
        let mut total = Amount::ZERO;
        for account in accounts {
            total = total.saturating_add(self.ledger.balance_of(asset_in, account).await);
        }
        Ok(total)
    }
}
