// Library root module for route-aggr
// This file defines the public API and module structure for the route-aggr library
// It exports the quote aggregation, swap execution and control plane components
//
// Numan Thabit 2025 Nov

pub mod assets;
pub mod config;
pub mod control;
pub mod errors;
pub mod ledger;
pub mod metrics;
pub mod quant;
pub mod router;
pub mod state;
pub mod venues;

#[cfg(test)]
pub(crate) mod testing;
