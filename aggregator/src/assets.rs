// Asset and account identifiers
// This file re-exports the 20-byte address and 256-bit amount types shared by
// accounts, venues and assets, and reserves the native-currency pseudo-asset
//
// Numan Thabit 2025 Nov

pub use alloy_primitives::{Address, U256};

/// Token amount in the asset's smallest unit.
pub type Amount = U256;

/// Alias used where an address denotes a fungible asset.
pub type Asset = Address;

/// Native-currency pseudo-asset. Never held by venues; substituted by the
/// configured wrapped asset at venue boundaries.
pub const NATIVE: Asset = Address::new([0xee; 20]);

pub trait AssetExt {
    fn is_native(&self) -> bool;
}

impl AssetExt for Address {
    fn is_native(&self) -> bool {
        *self == NATIVE
    }
}
