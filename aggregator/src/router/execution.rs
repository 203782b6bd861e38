// Execution engine - settles swaps along the live best route
// This file implements the swap path: pull input, re-select the route,
// execute each leg, enforce the slippage bound and deliver output,
// reverting the ledger to its pre-swap checkpoint on any failure
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset, AssetExt, NATIVE};
use crate::errors::{RouterError, VenueError};
use crate::ledger::{within_checkpoint, AssetLedger};
use crate::metrics;
use crate::router::routes::Route;
use crate::router::selector::RouteSelector;
use crate::state::RouterState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Caller-side parameters of a swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub caller: Address,
    pub asset_in: Asset,
    pub asset_out: Asset,
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    /// Native currency attached to the call. Must equal `amount_in` for
    /// native input and be zero otherwise.
    #[serde(default)]
    pub native_value: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapReceipt {
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub route: Route,
}

/// Execution statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionStats {
    pub total_swaps: u64,
    pub successful_swaps: u64,
    pub failed_swaps: u64,
    pub success_rate: f64,
}

/// Swap executor. Every call runs inside a ledger checkpoint so a failure
/// after the input pull leaves no trace.
pub struct ExecutionEngine {
    ledger: Arc<dyn AssetLedger>,
    selector: RouteSelector,
    total_swaps: AtomicU64,
    successful_swaps: AtomicU64,
    failed_swaps: AtomicU64,
}

impl ExecutionEngine {
    pub fn new(ledger: Arc<dyn AssetLedger>, selector: RouteSelector) -> Self {
        Self {
            ledger,
            selector,
            total_swaps: AtomicU64::new(0),
            successful_swaps: AtomicU64::new(0),
            failed_swaps: AtomicU64::new(0),
        }
    }

    pub fn get_stats(&self) -> ExecutionStats {
        let total = self.total_swaps.load(Ordering::Relaxed);
        let successful = self.successful_swaps.load(Ordering::Relaxed);
        ExecutionStats {
            total_swaps: total,
            successful_swaps: successful,
            failed_swaps: self.failed_swaps.load(Ordering::Relaxed),
            success_rate: if total > 0 {
                successful as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Execute a swap against `state`. The caller must hold the router's
    /// exclusive call gate.
    #[tracing::instrument(skip_all, fields(caller = %req.caller, asset_in = %req.asset_in, asset_out = %req.asset_out, amount_in = %req.amount_in))]
    pub async fn swap(
        &self,
        state: &RouterState,
        req: &SwapRequest,
    ) -> Result<SwapReceipt, RouterError> {
        self.total_swaps.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let result = match Self::check_preconditions(req) {
            Ok(()) => self.swap_in_checkpoint(state, req).await,
            Err(err) => Err(err),
        };

        metrics::SWAP_LATENCY.observe(started.elapsed().as_secs_f64());
        match &result {
            Ok(receipt) => {
                self.successful_swaps.fetch_add(1, Ordering::Relaxed);
                metrics::SWAPS.with_label_values(&["success"]).inc();
                info!(
                    amount_out = %receipt.amount_out,
                    hops = receipt.route.legs().len(),
                    "swap settled"
                );
            }
            Err(err) => {
                self.failed_swaps.fetch_add(1, Ordering::Relaxed);
                metrics::SWAPS.with_label_values(&[failure_label(err)]).inc();
                warn!(error = %err, "swap failed");
            }
        }
        result
    }

    fn check_preconditions(req: &SwapRequest) -> Result<(), RouterError> {
        if req.asset_in == req.asset_out {
            return Err(RouterError::InvalidPair(req.asset_in));
        }
        if req.amount_in.is_zero() {
            return Err(RouterError::AmountTooSmall);
        }
        if req.asset_in.is_native() {
            if req.native_value != req.amount_in {
                return Err(RouterError::NativeValueMismatch {
                    native_value: req.native_value,
                    amount_in: req.amount_in,
                });
            }
        } else if !req.native_value.is_zero() {
            return Err(RouterError::UnexpectedNativeValue);
        }
        Ok(())
    }

    async fn swap_in_checkpoint(
        &self,
        state: &RouterState,
        req: &SwapRequest,
    ) -> Result<SwapReceipt, RouterError> {
        // Only writes made by this task are journaled under the checkpoint,
        // so a revert leaves concurrent ledger activity in place.
        let checkpoint = self.ledger.checkpoint().await;
        match within_checkpoint(checkpoint, self.settle(state, req)).await {
            Ok(receipt) => {
                self.ledger.release(checkpoint).await?;
                Ok(receipt)
            }
            Err(err) => {
                if let Err(revert_err) = self.ledger.revert_to(checkpoint).await {
                    error!(checkpoint = checkpoint, error = %revert_err, "ledger revert failed");
                }
                Err(err)
            }
        }
    }

    async fn settle(
        &self,
        state: &RouterState,
        req: &SwapRequest,
    ) -> Result<SwapReceipt, RouterError> {
        let router = state.router_account;

        // 1. Take custody of the input.
        if req.asset_in.is_native() {
            self.ledger
                .transfer(NATIVE, req.caller, router, req.amount_in)
                .await?;
            self.ledger.wrap(router, req.amount_in).await?;
        } else {
            self.ledger
                .transfer_from(req.asset_in, router, req.caller, router, req.amount_in)
                .await?;
        }

        // 2. Re-select against live venue state.
        let quote = self
            .selector
            .find_best_route(state, req.asset_in, req.asset_out, req.amount_in)
            .await?;
        if !quote.is_viable() || quote.amount_out < req.min_amount_out {
            return Err(RouterError::InsufficientOutput {
                amount_out: quote.amount_out,
                min_amount_out: req.min_amount_out,
            });
        }

        // 3. Execute legs in order, chaining outputs.
        let mut amount = req.amount_in;
        for leg in quote.route.legs() {
            let venue = state.venues.get(leg.venue_slot).ok_or_else(|| {
                RouterError::VenueExecutionFailure {
                    venue: leg.venue,
                    source: VenueError::Reverted("venue slot unavailable".into()),
                }
            })?;
            amount = venue
                .execute(leg.asset_in, leg.asset_out, amount, router, router, leg.tier)
                .await
                .map_err(|source| RouterError::VenueExecutionFailure {
                    venue: leg.venue,
                    source,
                })?;
        }

        // 4. Realized output must still honour the bound.
        if amount < req.min_amount_out {
            return Err(RouterError::InsufficientOutput {
                amount_out: amount,
                min_amount_out: req.min_amount_out,
            });
        }

        // 5. Deliver, unwrapping for native output.
        if req.asset_out.is_native() {
            self.ledger.unwrap(router, amount).await?;
            self.ledger
                .transfer(NATIVE, router, req.caller, amount)
                .await?;
        } else {
            self.ledger
                .transfer(req.asset_out, router, req.caller, amount)
                .await?;
        }

        Ok(SwapReceipt {
            amount_in: req.amount_in,
            amount_out: amount,
            route: quote.route,
        })
    }
}

fn failure_label(err: &RouterError) -> &'static str {
    match err {
        RouterError::InsufficientOutput { .. } => "insufficient_output",
        RouterError::VenueExecutionFailure { .. } => "venue_failure",
        RouterError::Transfer(_) => "transfer_failure",
        _ => "rejected",
    }
}
