// Router facade and HTTP API
// This file ties route selection, swap execution and the control plane
// together behind one call gate, and exposes them over HTTP
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset};
use crate::control::ControlPlane;
use crate::errors::RouterError;
use crate::metrics;
use crate::state::{ConfigEvent, ConfigView, SharedState};
use crate::venues::adapter::Venue;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::execution::{ExecutionEngine, ExecutionStats, SwapReceipt, SwapRequest};
use super::routes::{Quote, RouteSelection};
use super::selector::RouteSelector;

/// High-level Router that ties selection, execution and configuration together.
///
/// Every call runs to completion relative to state-mutating calls: quotes
/// share the gate, swaps and configuration updates hold it exclusively.
pub struct Router {
    state: SharedState,
    control: ControlPlane,
    selector: RouteSelector,
    executor: Arc<ExecutionEngine>,
    gate: RwLock<()>,
}

impl Router {
    pub fn new(state: SharedState, executor: Arc<ExecutionEngine>) -> Self {
        Self {
            control: ControlPlane::new(state.clone()),
            state,
            selector: RouteSelector::new(),
            executor,
            gate: RwLock::new(()),
        }
    }

    /// Get access to the execution engine (for stats reporting)
    pub fn executor(&self) -> &Arc<ExecutionEngine> {
        &self.executor
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.state.subscribe()
    }

    pub async fn find_best_route(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> Result<Quote, RouterError> {
        let _guard = self.gate.read().await;
        let state = self.state.snapshot().await;
        self.selector
            .find_best_route(&state, asset_in, asset_out, amount_in)
            .await
    }

    /// Select route without executing (for quote/preview)
    pub async fn evaluate(
        &self,
        asset_in: Asset,
        asset_out: Asset,
        amount_in: Amount,
    ) -> Result<RouteSelection, RouterError> {
        let _guard = self.gate.read().await;
        let state = self.state.snapshot().await;
        self.selector
            .evaluate(&state, asset_in, asset_out, amount_in)
            .await
    }

    pub async fn swap(&self, req: &SwapRequest) -> Result<SwapReceipt, RouterError> {
        let _guard = self.gate.write().await;
        let state = self.state.snapshot().await;
        self.executor.swap(&state, req).await
    }

    pub async fn set_venue(
        &self,
        caller: Address,
        slot: usize,
        venue: Arc<dyn Venue>,
    ) -> Result<ConfigEvent, RouterError> {
        let _guard = self.gate.write().await;
        self.control.set_venue(caller, slot, venue).await
    }

    pub async fn set_intermediate_assets(
        &self,
        caller: Address,
        assets: Vec<Asset>,
    ) -> Result<ConfigEvent, RouterError> {
        let _guard = self.gate.write().await;
        self.control.set_intermediate_assets(caller, assets).await
    }

    pub async fn set_reserve_guard_multiplier(
        &self,
        caller: Address,
        multiplier: u128,
    ) -> Result<ConfigEvent, RouterError> {
        let _guard = self.gate.write().await;
        self.control
            .set_reserve_guard_multiplier(caller, multiplier)
            .await
    }

    pub async fn config_view(&self) -> ConfigView {
        self.state.snapshot().await.view()
    }

    pub fn stats(&self) -> ExecutionStats {
        self.executor.get_stats()
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub asset_in: Asset,
    pub asset_out: Asset,
    pub amount_in: Amount,
}

#[derive(Debug, Deserialize)]
pub struct IntermediateAssetsRequest {
    pub caller: Address,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
pub struct ReserveGuardRequest {
    pub caller: Address,
    pub multiplier: u128,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(err: &RouterError) -> StatusCode {
    match err {
        RouterError::InvalidPair(_)
        | RouterError::AmountTooSmall
        | RouterError::NativeValueMismatch { .. }
        | RouterError::UnexpectedNativeValue
        | RouterError::UnknownVenueSlot(_) => StatusCode::BAD_REQUEST,
        RouterError::Unauthorized(_) => StatusCode::FORBIDDEN,
        RouterError::NoOpUpdate(_) => StatusCode::CONFLICT,
        RouterError::InsufficientOutput { .. } | RouterError::Transfer(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RouterError::VenueExecutionFailure { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn api_error(err: RouterError) -> ApiError {
    (
        status_for(&err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Create the HTTP router with API endpoints
pub fn create_api_router(router: Arc<Router>) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/metrics", get(export_metrics))
        .route("/api/v1/quote", post(quote_route))
        .route("/api/v1/swap", post(execute_swap))
        .route("/api/v1/stats", get(get_stats))
        .route("/api/v1/config", get(get_config))
        .route(
            "/api/v1/config/intermediate-assets",
            put(update_intermediate_assets),
        )
        .route(
            "/api/v1/config/reserve-guard-multiplier",
            put(update_reserve_guard_multiplier),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(router)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn export_metrics() -> String {
    metrics::render()
}

/// Quote endpoint - returns the best route and every candidate without executing
async fn quote_route(
    State(router): State<Arc<Router>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<RouteSelection>, ApiError> {
    router
        .evaluate(req.asset_in, req.asset_out, req.amount_in)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn execute_swap(
    State(router): State<Arc<Router>>,
    Json(req): Json<SwapRequest>,
) -> Result<Json<SwapReceipt>, ApiError> {
    router.swap(&req).await.map(Json).map_err(api_error)
}

async fn get_stats(State(router): State<Arc<Router>>) -> Json<ExecutionStats> {
    Json(router.stats())
}

async fn get_config(State(router): State<Arc<Router>>) -> Json<ConfigView> {
    Json(router.config_view().await)
}

async fn update_intermediate_assets(
    State(router): State<Arc<Router>>,
    Json(req): Json<IntermediateAssetsRequest>,
) -> Result<Json<ConfigEvent>, ApiError> {
    router
        .set_intermediate_assets(req.caller, req.assets)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn update_reserve_guard_multiplier(
    State(router): State<Arc<Router>>,
    Json(req): Json<ReserveGuardRequest>,
) -> Result<Json<ConfigEvent>, ApiError> {
    router
        .set_reserve_guard_multiplier(req.caller, req.multiplier)
        .await
        .map(Json)
        .map_err(api_error)
}
