use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::model::{Client, OutageWindow, Service};

/// Smallest polling interval a client may ask for
pub const MIN_POLLING_INTERVAL_MS: u64 = 1000;

pub const MIN_GRACE_PERIOD_MS: u64 = 1000;

/// Exclusive upper bound for grace periods
pub const MAX_GRACE_PERIOD_MS: u64 = i32::MAX as u64;

const DEFAULT_GRACE_PERIOD_MS: u64 = 1000;

/// Upper bound for a single TCP connect attempt
pub const CONNECT_TIMEOUT_MS: u64 = 5000;

const MONITOR_GRACE_PERIOD_MS: &str = "MONITOR_GRACE_PERIOD_MS";

pub fn get_default_grace_period() -> u64 {
    DEFAULT_GRACE_PERIOD_MS
}

pub fn get_default_polling_interval() -> u64 {
    MIN_POLLING_INTERVAL_MS
}

/// Grace period from the environment, falling back to the default
pub fn get_grace_period() -> u64 {
    let grace_from_env = std::env::var(MONITOR_GRACE_PERIOD_MS);
    grace_from_env.map_or(DEFAULT_GRACE_PERIOD_MS, |res| {
        res.parse().unwrap_or(DEFAULT_GRACE_PERIOD_MS)
    })
}

/// Build a service with a single client already registered
pub fn prepare_service_with_pre_registered_client(
    host: &str,
    port: u16,
    polling_interval_ms: u64,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Arc<Service> {
    let service = Service::new(host, port);
    let client = Client::new(
        polling_interval_ms,
        OutageWindow::new(window_start, window_end),
    );
    service.register_client(client);
    service
}
