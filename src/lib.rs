//! # Home Zenith - Home Server Dashboard Backend
//!
//! The backend for the Home Zenith dashboard: a small service that samples
//! host metrics (CPU, memory, disk, temperature, uptime) and network
//! throughput on fixed timers, persists every sample to an embedded SQLite
//! store, and pushes each new sample to connected dashboard clients over
//! WebSocket. A JSON API serves the latest sample and time-range history for
//! both metric kinds.
//!
//! ## Features
//!
//! - **Periodic sampling**: independent system and network samplers with
//!   configurable intervals
//! - **Durable history**: every sample lands in SQLite before it is broadcast
//! - **Live updates**: `system-metrics` / `network-metrics` events fan out to
//!   all connected WebSocket sessions
//! - **Query API**: latest and history endpoints for both metric kinds
//! - **Library + Binary**: use as a crate or standalone application
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::{path::Path, sync::Arc};
//! use home_zenith::{
//!     run_system_sampler, AppState, MetricsStore, SystemSampler, WebConfig,
//!     EVENT_CHANNEL_CAPACITY,
//! };
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MetricsStore::open(Path::new("homezenith.db"), 0)?);
//!     let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
//!
//!     let sampler = SystemSampler::new()?;
//!     tokio::spawn(run_system_sampler(sampler, 5_000, Arc::clone(&store), events.clone()));
//!
//!     let state = AppState::new(store, events, 100);
//!     home_zenith::start_web_server(WebConfig::default(), state).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod web;

// Re-export public API
pub use config::EnvConfig;
pub use error::{Result, ZenithError};
pub use metrics::{
    collector::{
        run_network_sampler, run_system_sampler, NetworkSampler, SystemSampler,
        EVENT_CHANNEL_CAPACITY,
    },
    data::{
        MetricEvent, NetworkMetricSample, NetworkSampleDraft, SystemMetricSample,
        SystemSampleDraft,
    },
    traits::Sampler,
};
pub use store::MetricsStore;
pub use web::{start_web_server, AppState, WebConfig};

/// The default system sampling interval in milliseconds
pub const DEFAULT_SYSTEM_INTERVAL_MS: u64 = 5_000;

/// The default network sampling interval in milliseconds
pub const DEFAULT_NETWORK_INTERVAL_MS: u64 = 10_000;

/// The default HTTP listen port
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// The default SQLite database path
pub const DEFAULT_DB_PATH: &str = "homezenith.db";
