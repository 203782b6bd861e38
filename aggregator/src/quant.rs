// Fixed-point pool math for the in-process venues
// This file handles fee-adjusted constant-product output computation
// with checked 256-bit arithmetic
//
// Numan Thabit 2025 Nov

use crate::assets::{Amount, U256};
use crate::errors::VenueError;

/// Fees are expressed in parts per million of the input amount.
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// Default fee for simple AMM pools (0.3%).
pub const DEFAULT_SIMPLE_FEE_PPM: u32 = 3_000;

/// Fee tiers offered by tiered venues unless configured otherwise.
pub const DEFAULT_FEE_TIERS: [u32; 4] = [100, 500, 3_000, 10_000];

/// Output of an exact-input swap against `x * y = k` reserves after the input fee.
pub fn amount_out_exact_in(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    fee_ppm: u32,
) -> Result<Amount, VenueError> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(VenueError::NoLiquidity);
    }
    if fee_ppm >= FEE_DENOMINATOR {
        return Err(VenueError::Reverted(format!("fee {fee_ppm} ppm consumes whole input")));
    }
    if amount_in.is_zero() {
        return Ok(U256::ZERO);
    }

    let in_after_fee = amount_in
        .checked_mul(U256::from(FEE_DENOMINATOR - fee_ppm))
        .ok_or(VenueError::Overflow)?;
    let numerator = in_after_fee
        .checked_mul(reserve_out)
        .ok_or(VenueError::Overflow)?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .and_then(|scaled| scaled.checked_add(in_after_fee))
        .ok_or(VenueError::Overflow)?;

    Ok(numerator / denominator)
}
