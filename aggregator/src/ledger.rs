// Asset transfer capability
// This file defines the ledger interface the router pulls and pushes assets through,
// plus an in-memory implementation with journaled checkpoint/rollback support
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset, NATIVE};
use crate::errors::LedgerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Identifier of an open ledger checkpoint.
pub type CheckpointId = u64;

tokio::task_local! {
    static ACTIVE_CHECKPOINT: CheckpointId;
}

/// Run `fut` with its ledger writes recorded against checkpoint `id`.
///
/// Only writes made inside this scope (on the same task) are undone by
/// [`AssetLedger::revert_to`]; writes from other tasks are left alone.
pub async fn within_checkpoint<F: Future>(id: CheckpointId, fut: F) -> F::Output {
    ACTIVE_CHECKPOINT.scope(id, fut).await
}

fn active_checkpoint() -> Option<CheckpointId> {
    ACTIVE_CHECKPOINT.try_with(|id| *id).ok()
}

/// Pull/push semantics for fungible assets, native value handling and an
/// explicit transaction boundary.
#[async_trait]
pub trait AssetLedger: Send + Sync {
    /// Designated wrapped representation of the native currency.
    fn wrapped_native(&self) -> Asset;

    async fn balance_of(&self, asset: Asset, account: Address) -> Amount;

    async fn allowance(&self, asset: Asset, owner: Address, spender: Address) -> Amount;

    async fn approve(&self, asset: Asset, owner: Address, spender: Address, amount: Amount);

    /// Push-style transfer, authorised by `from`.
    async fn transfer(
        &self,
        asset: Asset,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Pull-style transfer that spends `spender`'s allowance on `from`.
    async fn transfer_from(
        &self,
        asset: Asset,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Convert native currency held by `account` into the wrapped asset, 1:1.
    async fn wrap(&self, account: Address, amount: Amount) -> Result<(), LedgerError>;

    /// Convert wrapped asset held by `account` back into native currency, 1:1.
    async fn unwrap(&self, account: Address, amount: Amount) -> Result<(), LedgerError>;

    /// Open a checkpoint. Writes made under [`within_checkpoint`] with this id
    /// are journaled until the checkpoint is reverted or released.
    async fn checkpoint(&self) -> CheckpointId;

    /// Undo every journaled write of `id`, newest first, and close it.
    async fn revert_to(&self, id: CheckpointId) -> Result<(), LedgerError>;

    /// Close the checkpoint, keeping its writes.
    async fn release(&self, id: CheckpointId) -> Result<(), LedgerError>;
}

/// One reversible ledger write.
#[derive(Debug, Clone, Copy)]
enum Change {
    Credited {
        asset: Asset,
        account: Address,
        amount: Amount,
    },
    Debited {
        asset: Asset,
        account: Address,
        amount: Amount,
    },
    AllowanceSpent {
        key: (Asset, Address, Address),
        amount: Amount,
    },
    AllowanceSet {
        key: (Asset, Address, Address),
        previous: Amount,
    },
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(Asset, Address), Amount>,
    allowances: HashMap<(Asset, Address, Address), Amount>,
    journals: HashMap<CheckpointId, Vec<Change>>,
}

impl LedgerState {
    fn balance(&self, asset: Asset, account: Address) -> Amount {
        self.balances
            .get(&(asset, account))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, key: &(Asset, Address, Address)) -> Amount {
        self.allowances.get(key).copied().unwrap_or_default()
    }

    fn record(&mut self, scope: Option<CheckpointId>, change: Change) {
        if let Some(journal) = scope.and_then(|id| self.journals.get_mut(&id)) {
            journal.push(change);
        }
    }

    fn debit(
        &mut self,
        scope: Option<CheckpointId>,
        asset: Asset,
        account: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.balance(asset, account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                asset,
                account,
                available,
                required: amount,
            });
        }
        self.balances.insert((asset, account), available - amount);
        self.record(
            scope,
            Change::Debited {
                asset,
                account,
                amount,
            },
        );
        Ok(())
    }

    fn credit(
        &mut self,
        scope: Option<CheckpointId>,
        asset: Asset,
        account: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let next = self
            .balance(asset, account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { asset })?;
        self.balances.insert((asset, account), next);
        self.record(
            scope,
            Change::Credited {
                asset,
                account,
                amount,
            },
        );
        Ok(())
    }

    fn move_balance(
        &mut self,
        scope: Option<CheckpointId>,
        asset: Asset,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        // Validate the credit side first so a failed transfer leaves no debit behind.
        if from != to {
            self.balance(asset, to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow { asset })?;
        }
        self.debit(scope, asset, from, amount)?;
        self.credit(scope, asset, to, amount)
    }

    fn undo(&mut self, change: Change) -> Result<(), LedgerError> {
        match change {
            Change::Credited {
                asset,
                account,
                amount,
            } => self.debit(None, asset, account, amount),
            Change::Debited {
                asset,
                account,
                amount,
            } => self.credit(None, asset, account, amount),
            Change::AllowanceSpent { key, amount } => {
                let restored = self.allowance(&key).saturating_add(amount);
                self.allowances.insert(key, restored);
                Ok(())
            }
            Change::AllowanceSet { key, previous } => {
                self.allowances.insert(key, previous);
                Ok(())
            }
        }
    }
}

/// Ledger kept entirely in memory. Venues in this crate store their reserves
/// here too, so a single checkpoint covers every effect of a swap.
pub struct InMemoryLedger {
    wrapped_native: Asset,
    state: RwLock<LedgerState>,
    next_checkpoint: AtomicU64,
}

impl InMemoryLedger {
    pub fn new(wrapped_native: Asset) -> Self {
        Self {
            wrapped_native,
            state: RwLock::new(LedgerState::default()),
            next_checkpoint: AtomicU64::new(1),
        }
    }

    /// Create new units of `asset` for `account` (genesis and test funding).
    pub async fn mint(
        &self,
        asset: Asset,
        account: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.credit(active_checkpoint(), asset, account, amount)?;
        debug!(asset = %asset, account = %account, amount = %amount, "minted");
        Ok(())
    }
}

#[async_trait]
impl AssetLedger for InMemoryLedger {
    fn wrapped_native(&self) -> Asset {
        self.wrapped_native
    }

    async fn balance_of(&self, asset: Asset, account: Address) -> Amount {
        self.state.read().await.balance(asset, account)
    }

    async fn allowance(&self, asset: Asset, owner: Address, spender: Address) -> Amount {
        self.state.read().await.allowance(&(asset, owner, spender))
    }

    async fn approve(&self, asset: Asset, owner: Address, spender: Address, amount: Amount) {
        let scope = active_checkpoint();
        let mut state = self.state.write().await;
        let key = (asset, owner, spender);
        let previous = state.allowances.insert(key, amount).unwrap_or_default();
        state.record(scope, Change::AllowanceSet { key, previous });
    }

    async fn transfer(
        &self,
        asset: Asset,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let scope = active_checkpoint();
        let mut state = self.state.write().await;
        state.move_balance(scope, asset, from, to, amount)
    }

    async fn transfer_from(
        &self,
        asset: Asset,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let scope = active_checkpoint();
        let mut state = self.state.write().await;
        let key = (asset, from, spender);
        let available = state.allowance(&key);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                asset,
                owner: from,
                spender,
                available,
                required: amount,
            });
        }
        state.move_balance(scope, asset, from, to, amount)?;
        state.allowances.insert(key, available - amount);
        state.record(scope, Change::AllowanceSpent { key, amount });
        Ok(())
    }

    async fn wrap(&self, account: Address, amount: Amount) -> Result<(), LedgerError> {
        let scope = active_checkpoint();
        let mut state = self.state.write().await;
        state.debit(scope, NATIVE, account, amount)?;
        state.credit(scope, self.wrapped_native, account, amount)
    }

    async fn unwrap(&self, account: Address, amount: Amount) -> Result<(), LedgerError> {
        let scope = active_checkpoint();
        let mut state = self.state.write().await;
        state.debit(scope, self.wrapped_native, account, amount)?;
        state.credit(scope, NATIVE, account, amount)
    }

    async fn checkpoint(&self) -> CheckpointId {
        let id = self.next_checkpoint.fetch_add(1, Ordering::Relaxed);
        self.state.write().await.journals.insert(id, Vec::new());
        id
    }

    async fn revert_to(&self, id: CheckpointId) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let journal = state
            .journals
            .remove(&id)
            .ok_or(LedgerError::UnknownCheckpoint(id))?;
        let writes = journal.len();
        for change in journal.into_iter().rev() {
            state.undo(change)?;
        }
        debug!(checkpoint = id, writes = writes, "ledger reverted");
        Ok(())
    }

    async fn release(&self, id: CheckpointId) -> Result<(), LedgerError> {
        self.state
            .write()
            .await
            .journals
            .remove(&id)
            .map(|_| ())
            .ok_or(LedgerError::UnknownCheckpoint(id))
    }
}
