use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use route_aggr::config::AppConfig;
use route_aggr::router::Router;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal aggregator error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration")?;
    let runtime = config.build().await.context("build router from configuration")?;

    let app = App {
        config: Arc::new(config),
        router: runtime.router,
    };

    app.run().await
}

struct App {
    config: Arc<AppConfig>,
    router: Arc<Router>,
}

impl App {
    async fn run(self) -> Result<()> {
        let view = self.router.config_view().await;
        info!(
            owner = %view.owner,
            venues = view.venues.len(),
            intermediate_assets = view.intermediate_assets.len(),
            reserve_guard_multiplier = view.reserve_guard_multiplier,
            "route aggregator online"
        );
        for venue in &view.venues {
            info!(
                slot = venue.slot,
                address = %venue.address,
                kind = %venue.kind,
                tiers = ?venue.fee_tiers,
                "venue slot"
            );
        }

        // Surface configuration changes in the log stream
        let mut events = self.router.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => info!(event = ?event, "configuration changed"),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "configuration event listener lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // Start HTTP API server
        let api_router = route_aggr::router::router::create_api_router(self.router.clone());
        let api_addr = self.config.api_addr;
        let listener = tokio::net::TcpListener::bind(&api_addr)
            .await
            .with_context(|| format!("bind API server address {api_addr}"))?;

        info!(address = %api_addr, "HTTP API server starting");
        let _api_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, api_router).await {
                warn!(error = %e, "API server error");
            }
        });

        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.router.stats();
                    info!(
                        total_swaps = stats.total_swaps,
                        successful = stats.successful_swaps,
                        failed = stats.failed_swaps,
                        success_rate = stats.success_rate,
                        "aggregator heartbeat"
                    );
                }
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(error = %err, "ctrl_c listener error");
                    }
                    info!("Shutdown signal received, exiting");
                    break;
                }
            }
        }
        Ok(())
    }
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,tower_http=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
