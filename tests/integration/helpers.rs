//! Helper functions for integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use liveness_monitor::{
    Client, InputValidator, MonitorConfig, MonitorService, OutageWindow, ProbeOutcome, Prober,
};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Prober with a per-port outcome that tests can flip at any time
pub struct ScriptedProber {
    default: ProbeOutcome,
    outcomes: Mutex<HashMap<u16, ProbeOutcome>>,
    probes: Mutex<HashMap<u16, Vec<Instant>>>,
}

impl ScriptedProber {
    pub fn new(default: ProbeOutcome) -> Arc<Self> {
        Arc::new(Self {
            default,
            outcomes: Mutex::new(HashMap::new()),
            probes: Mutex::new(HashMap::new()),
        })
    }

    pub fn set(&self, port: u16, outcome: ProbeOutcome) {
        self.outcomes.lock().insert(port, outcome);
    }

    pub fn calls(&self, port: u16) -> usize {
        self.probes.lock().get(&port).map_or(0, Vec::len)
    }

    pub fn probe_times(&self, port: u16) -> Vec<Instant> {
        self.probes.lock().get(&port).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, _host: &str, port: u16) -> ProbeOutcome {
        self.probes
            .lock()
            .entry(port)
            .or_default()
            .push(Instant::now());

        self.outcomes
            .lock()
            .get(&port)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Counts how often clients built from it were notified
#[derive(Clone, Default)]
pub struct Notifications(Arc<AtomicUsize>);

impl Notifications {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn client(&self, interval: u64, window: OutageWindow) -> Client {
        let counter = self.0.clone();
        Client::new(interval, window).with_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Window that ended an hour ago
pub fn past_window() -> OutageWindow {
    let now = Utc::now();
    OutageWindow::new(now - Duration::hours(2), now - Duration::hours(1))
}

/// Window covering the next few hours
pub fn active_window() -> OutageWindow {
    let now = Utc::now();
    OutageWindow::new(now - Duration::minutes(1), now + Duration::hours(3))
}

pub fn create_monitor(prober: Arc<ScriptedProber>) -> MonitorService {
    MonitorService::with_components(
        Arc::new(MonitorConfig::default()),
        Arc::new(InputValidator),
        prober,
    )
}

pub fn create_monitor_with(config: MonitorConfig, prober: Arc<ScriptedProber>) -> MonitorService {
    MonitorService::with_components(Arc::new(config), Arc::new(InputValidator), prober)
}
