// Configuration management module
// This file handles loading and parsing of configuration settings
// from an optional YAML file layered under environment variables, and
// assembles the ledger, venues and router they describe
//
// Numan Thabit 2025 Nov

use crate::assets::{Address, Amount, Asset, AssetExt};
use crate::ledger::InMemoryLedger;
use crate::quant::{DEFAULT_FEE_TIERS, DEFAULT_SIMPLE_FEE_PPM};
use crate::router::execution::ExecutionEngine;
use crate::router::selector::RouteSelector;
use crate::router::validation::DEFAULT_RESERVE_GUARD_MULTIPLIER;
use crate::router::Router;
use crate::state::{RouterState, SharedState};
use crate::venues::{ConstantProductVenue, TieredVenue, VenueAdapter, VenueKind};
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Environment variable naming the optional YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "ROUTE_AGGR_CONFIG";

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Only this account may change the configuration
    pub owner: Address,
    /// Account holding assets in flight during a swap
    pub router_address: Address,
    /// Wrapped form of the native currency
    pub wrapped_native: Asset,
    #[serde(
        default = "default_multiplier",
        deserialize_with = "deserialize_multiplier"
    )]
    pub reserve_guard_multiplier: u128,
    #[serde(default)]
    pub intermediate_assets: Vec<Asset>,
    #[serde(default = "default_api_addr")]
    pub api_addr: SocketAddr,
    pub venues: Vec<VenueConfig>,
    /// Genesis balances credited before the router starts
    #[serde(default)]
    pub balances: Vec<BalanceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub kind: VenueKind,
    pub address: Address,
    /// Swap fee for simple venues, in parts per million
    pub fee_ppm: Option<u32>,
    /// Offered tiers for tiered venues, in evaluation order
    pub fee_tiers: Option<Vec<u32>>,
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub asset_a: Asset,
    pub asset_b: Asset,
    /// Required for tiered venues
    pub tier: Option<u32>,
    /// Account holding the pool reserves
    pub account: Address,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub reserve_a: Amount,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub reserve_b: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceConfig {
    pub asset: Asset,
    pub account: Address,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
}

/// Everything the binary needs once configuration is applied.
pub struct Runtime {
    pub ledger: Arc<InMemoryLedger>,
    pub router: Arc<Router>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(config::File::new(&path, config::FileFormat::Yaml));
        }
        Self::from_builder(builder.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        ))
    }

    /// Parse an inline YAML document, without environment overrides.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::from_str(source, config::FileFormat::Yaml)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config: Self = builder
            .build()
            .context("read configuration sources")?
            .try_deserialize()
            .context("parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.venues.is_empty(), "at least one venue must be configured");
        ensure!(
            !self.wrapped_native.is_native(),
            "wrapped native asset cannot be the native sentinel"
        );

        let mut seen = HashSet::new();
        for venue in &self.venues {
            if !seen.insert(venue.address) {
                bail!("duplicate venue address {}", venue.address);
            }
            match venue.kind {
                VenueKind::SimpleAmm => {
                    if venue.pools.iter().any(|pool| pool.tier.is_some()) {
                        bail!("simple venue {} does not take pool tiers", venue.address);
                    }
                }
                VenueKind::TieredAmm => {
                    let tiers = venue.tiers();
                    ensure!(!tiers.is_empty(), "tiered venue {} offers no tiers", venue.address);
                    for pool in &venue.pools {
                        match pool.tier {
                            Some(tier) if tiers.contains(&tier) => {}
                            Some(tier) => bail!(
                                "pool tier {tier} is not offered by venue {}",
                                venue.address
                            ),
                            None => bail!("tiered venue {} pool needs a tier", venue.address),
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Build the in-memory ledger, seed pools and balances, and assemble the router.
    pub async fn build(&self) -> Result<Runtime> {
        let ledger = Arc::new(InMemoryLedger::new(self.wrapped_native));
        let mut venues = Vec::with_capacity(self.venues.len());

        for venue in &self.venues {
            let adapter = match venue.kind {
                VenueKind::SimpleAmm => {
                    let amm = ConstantProductVenue::new(
                        venue.address,
                        venue.fee_ppm.unwrap_or(DEFAULT_SIMPLE_FEE_PPM),
                        ledger.clone(),
                    );
                    for pool in &venue.pools {
                        amm.create_pool(pool.asset_a, pool.asset_b, pool.account)
                            .await
                            .with_context(|| format!("create pool on venue {}", venue.address))?;
                    }
                    VenueAdapter::from(Arc::new(amm))
                }
                VenueKind::TieredAmm => {
                    let tiered = TieredVenue::new(venue.address, venue.tiers(), ledger.clone());
                    for pool in &venue.pools {
                        let tier = pool.tier.with_context(|| {
                            format!("tiered venue {} pool needs a tier", venue.address)
                        })?;
                        tiered
                            .create_pool(pool.asset_a, pool.asset_b, tier, pool.account)
                            .await
                            .with_context(|| format!("create pool on venue {}", venue.address))?;
                    }
                    VenueAdapter::from(Arc::new(tiered))
                }
            };

            for pool in &venue.pools {
                ledger.mint(pool.asset_a, pool.account, pool.reserve_a).await?;
                ledger.mint(pool.asset_b, pool.account, pool.reserve_b).await?;
            }
            info!(
                venue = %venue.address,
                kind = %venue.kind,
                pools = venue.pools.len(),
                "venue configured"
            );
            venues.push(adapter);
        }

        for balance in &self.balances {
            ledger
                .mint(balance.asset, balance.account, balance.amount)
                .await
                .with_context(|| format!("credit genesis balance for {}", balance.account))?;
        }

        let state = RouterState {
            owner: self.owner,
            router_account: self.router_address,
            wrapped_native: self.wrapped_native,
            venues,
            intermediate_assets: self.intermediate_assets.clone(),
            reserve_guard_multiplier: self.reserve_guard_multiplier,
        };
        let shared = SharedState::new(state, EVENT_BUFFER);
        let engine = Arc::new(ExecutionEngine::new(ledger.clone(), RouteSelector::new()));

        Ok(Runtime {
            ledger,
            router: Arc::new(Router::new(shared, engine)),
        })
    }
}

impl VenueConfig {
    pub fn tiers(&self) -> Vec<u32> {
        self.fee_tiers
            .clone()
            .unwrap_or_else(|| DEFAULT_FEE_TIERS.to_vec())
    }
}

fn default_multiplier() -> u128 {
    DEFAULT_RESERVE_GUARD_MULTIPLIER
}

fn default_api_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Integer or string form of a configured number.
///
/// YAML integers are read as 64-bit values, so amounts above `u64::MAX`
/// (most 18-decimal balances) must be written as quoted decimal strings.
/// Underscores are accepted as digit separators in the string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Int(u64),
    Text(String),
}

impl NumberRepr {
    fn digits(text: &str) -> String {
        text.trim().replace('_', "")
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberRepr::deserialize(deserializer)? {
        NumberRepr::Int(value) => Ok(Amount::from(value)),
        NumberRepr::Text(text) => NumberRepr::digits(&text)
            .parse::<Amount>()
            .map_err(|err| serde::de::Error::custom(format!("invalid amount {text:?}: {err}"))),
    }
}

fn deserialize_multiplier<'de, D>(deserializer: D) -> std::result::Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberRepr::deserialize(deserializer)? {
        NumberRepr::Int(value) => Ok(u128::from(value)),
        NumberRepr::Text(text) => NumberRepr::digits(&text).parse().map_err(|err| {
            serde::de::Error::custom(format!("invalid multiplier {text:?}: {err}"))
        }),
    }
}
