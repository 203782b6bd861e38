// Router module - route search and swap execution plane
// This file wires the route selector, liquidity guard and execution engine
// behind the Router facade and its HTTP API
//
// Numan Thabit 2025 Nov

pub mod execution;
pub mod routes;
pub mod selector;
pub mod validation;

#[allow(clippy::module_inception)]
pub mod router;

pub use execution::{ExecutionEngine, ExecutionStats, SwapReceipt, SwapRequest};
pub use router::Router;
pub use routes::{Quote, Route, RouteLeg, RouteSelection};
pub use selector::RouteSelector;
pub use validation::LiquidityGuard;
