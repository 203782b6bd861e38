// Metrics and observability module
// This file handles collection and reporting of route-search, venue-quote
// and swap metrics for the aggregator
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Encoder,
    Histogram, IntCounter, TextEncoder,
};

pub static VENUE_QUOTES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "aggr_venue_quotes_total",
        "venue quote calls by venue kind and outcome",
        &["kind", "outcome"]
    )
    .unwrap()
});

pub static GUARD_REJECTIONS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "aggr_liquidity_guard_rejections_total",
        "simple venues excluded by the liquidity guard"
    )
    .unwrap()
});

pub static ROUTE_SEARCHES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "aggr_route_searches_total",
        "route searches by result",
        &["result"]
    )
    .unwrap()
});

pub static SWAPS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("aggr_swaps_total", "swaps by outcome", &["outcome"]).unwrap()
});

pub static SWAP_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!("aggr_swap_latency_seconds", "end-to-end swap latency").unwrap()
});

/// Text exposition of the default registry.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
