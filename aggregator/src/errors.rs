// Error types and error handling module
// This file defines the error taxonomy for the ledger, the venue adapters
// and the router's public operations
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset};
use thiserror::Error;

/// Failures raised by the asset transfer capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance of {asset} for {account}: have {available}, need {required}")]
    InsufficientBalance {
        asset: Asset,
        account: Address,
        available: Amount,
        required: Amount,
    },
    #[error("insufficient allowance of {asset} from {owner} to {spender}: have {available}, need {required}")]
    InsufficientAllowance {
        asset: Asset,
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },
    #[error("unknown ledger checkpoint {0}")]
    UnknownCheckpoint(u64),
    #[error("balance overflow for {asset}")]
    Overflow { asset: Asset },
}

/// Failures reported by a venue. Swallowed during quoting, fatal during execution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VenueError {
    #[error("no pool for {asset_in} -> {asset_out}")]
    NoPool { asset_in: Asset, asset_out: Asset },
    #[error("fee tier {0} not offered by venue")]
    UnsupportedTier(u32),
    #[error("fee tier required for tiered venue")]
    TierRequired,
    #[error("pool has no liquidity")]
    NoLiquidity,
    #[error("arithmetic overflow in venue math")]
    Overflow,
    #[error("venue reverted: {0}")]
    Reverted(String),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors surfaced by the router's query, swap and admin operations.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("source and destination asset are identical: {0}")]
    InvalidPair(Asset),
    #[error("input amount must be greater than zero")]
    AmountTooSmall,
    #[error("insufficient output: got {amount_out}, minimum {min_amount_out}")]
    InsufficientOutput {
        amount_out: Amount,
        min_amount_out: Amount,
    },
    #[error("caller {0} is not the owner")]
    Unauthorized(Address),
    #[error("update to {0} leaves configuration unchanged")]
    NoOpUpdate(&'static str),
    #[error("venue {venue} failed during execution: {source}")]
    VenueExecutionFailure {
        venue: Address,
        #[source]
        source: VenueError,
    },
    #[error("native value {native_value} does not match input amount {amount_in}")]
    NativeValueMismatch {
        native_value: Amount,
        amount_in: Amount,
    },
    #[error("native value attached to non-native input")]
    UnexpectedNativeValue,
    #[error("unknown venue slot {0}")]
    UnknownVenueSlot(usize),
    #[error("transfer failed: {0}")]
    Transfer(#[from] LedgerError),
}
