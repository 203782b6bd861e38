// Venue module
// Liquidity sources the router quotes and executes against
//
// Numan Thabit 2025 Nov

pub mod adapter;
pub mod amm;
pub mod tiered;

pub use adapter::{Venue, VenueAdapter, VenueKind};
pub use amm::ConstantProductVenue;
pub use tiered::TieredVenue;
