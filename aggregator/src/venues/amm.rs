// AMM venue adapter module
// This file implements the simple constant-product venue and the pool
// primitive shared with the tiered venue
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset};
use crate::errors::VenueError;
use crate::ledger::AssetLedger;
use crate::quant::amount_out_exact_in;
use crate::venues::adapter::{Venue, VenueKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Order-independent key for an asset pair.
pub(crate) fn pair_key(a: Asset, b: Asset) -> (Asset, Asset) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One constant-product pool whose reserves are its account's ledger balances.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pool {
    pub account: Address,
    pub fee_ppm: u32,
}

impl Pool {
    pub async fn quote(
        &self,
        ledger: &dyn AssetLedger,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> Result<Amount, VenueError> {
        let reserve_in = ledger.balance_of(asset_in, self.account).await;
        let reserve_out = ledger.balance_of(asset_out, self.account).await;
        amount_out_exact_in(amount_in, reserve_in, reserve_out, self.fee_ppm)
    }

    pub async fn swap(
        &self,
        ledger: &dyn AssetLedger,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        payer: Address,
        recipient: Address,
    ) -> Result<Amount, VenueError> {
        let amount_out = self.quote(ledger, asset_in, asset_out, amount_in).await?;
        if amount_out.is_zero() {
            return Err(VenueError::Reverted("insufficient output amount".into()));
        }
        ledger.transfer(asset_in, payer, self.account, amount_in).await?;
        ledger
            .transfer(asset_out, self.account, recipient, amount_out)
            .await?;
        debug!(
            pool = %self.account,
            asset_in = %asset_in,
            asset_out = %asset_out,
            amount_in = %amount_in,
            amount_out = %amount_out,
            "pool swap settled"
        );
        Ok(amount_out)
    }

    /// Deposit both sides of the pair from `provider`.
    pub async fn deposit(
        &self,
        ledger: &dyn AssetLedger,
        provider: Address,
        (asset_a, amount_a): (Asset, Amount),
        (asset_b, amount_b): (Asset, Amount),
    ) -> Result<(), VenueError> {
        ledger.transfer(asset_a, provider, self.account, amount_a).await?;
        ledger.transfer(asset_b, provider, self.account, amount_b).await?;
        Ok(())
    }
}

/// Simple AMM: at most one pool per pair, fixed fee.
pub struct ConstantProductVenue {
    address: Address,
    fee_ppm: u32,
    ledger: Arc<dyn AssetLedger>,
    pools: RwLock<HashMap<(Asset, Asset), Pool>>,
}

impl ConstantProductVenue {
    pub fn new(address: Address, fee_ppm: u32, ledger: Arc<dyn AssetLedger>) -> Self {
        Self {
            address,
            fee_ppm,
            ledger,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Register `account` as the pool for `(asset_a, asset_b)`.
    pub async fn create_pool(
        &self,
        asset_a: Asset,
        asset_b: Asset,
        account: Address,
    ) -> Result<(), VenueError> {
        if asset_a == asset_b {
            return Err(VenueError::Reverted("identical pool assets".into()));
        }
        let mut pools = self.pools.write().await;
        let key = pair_key(asset_a, asset_b);
        if pools.contains_key(&key) {
            return Err(VenueError::Reverted(format!(
                "pool {asset_a}/{asset_b} already exists"
            )));
        }
        pools.insert(
            key,
            Pool {
                account,
                fee_ppm: self.fee_ppm,
            },
        );
        info!(
            venue = %self.address,
            pool = %account,
            asset_a = %asset_a,
            asset_b = %asset_b,
            "constant-product pool created"
        );
        Ok(())
    }

    pub async fn add_liquidity(
        &self,
        provider: Address,
        side_a: (Asset, Amount),
        side_b: (Asset, Amount),
    ) -> Result<(), VenueError> {
        let pool = self.pool(side_a.0, side_b.0).await?;
        pool.deposit(self.ledger.as_ref(), provider, side_a, side_b)
            .await
    }

    async fn pool(&self, asset_in: Asset, asset_out: Asset) -> Result<Pool, VenueError> {
        self.pools
            .read()
            .await
            .get(&pair_key(asset_in, asset_out))
            .copied()
            .ok_or(VenueError::NoPool {
                asset_in,
                asset_out,
            })
    }
}

#[async_trait]
impl Venue for ConstantProductVenue {
    fn address(&self) -> Address {
        self.address
    }

    fn kind(&self) -> VenueKind {
        VenueKind::SimpleAmm
    }

    fn fee_tiers(&self) -> &[u32] {
        &[]
    }

    async fn quote(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
        _tier: Option<u32>,
    ) -> Result<Amount, VenueError> {
        let pool = self.pool(asset_in, asset_out).await?;
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
        _tier: Option<u32>,
    ) -> Result<Amount, VenueError> {
        let pool = self.pool(asset_in, asset_out).await?;
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

    async fn reserve_of(&self, asset_in: Asset, asset_out: Asset) -> Result<Amount, VenueError> {
        let pool = self.pool(asset_in, asset_out).await?;
        Ok(self.ledger.balance_of(asset_in, pool.account).await)
    }
}
