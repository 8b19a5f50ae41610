//! PollWorker - probes one service until it is told to stop
//!
//! Each monitored service gets exactly one worker task. The worker owns no
//! state of its own beyond the current step; everything observable lives on
//! the [`Service`] it was spawned for.
//!
//! ## State Machine
//!
//! ```text
//!            ┌──────────── reachable: sleep polling interval ─────┐
//!            ▼                                                    │
//!   ┌──── POLLING ── refused ──▶ CONFIRM_FAILURE ── sleep grace ──┤
//!   │        │  ▲                        │                        │
//!   │        │  └─ transient: pace ──────┘ recheck refused:       │
//!   │        │                             set_status(false) ─────┘
//!   │        └── stopped or shut down ──▶ STOPPED
//! ```
//!
//! The stop flag and the shutdown token are only consulted at the top of
//! POLLING. A cancelled wait (see
//! [`MonitorService::shutdown`](super::MonitorService::shutdown)) skips
//! straight back to POLLING without side effects, where the worker stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::model::{Service, ServiceKey};
use crate::probe::{ProbeOutcome, Prober};

use super::registry::MonitorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Polling,
    ConfirmFailure,
    Stopped,
}

/// Runs the connect / confirm / notify loop for a single service
pub struct PollWorker {
    service: Arc<Service>,

    /// Shared config, read fresh for every grace period
    config: Arc<MonitorConfig>,

    prober: Arc<dyn Prober>,

    /// Interrupts in-flight waits on shutdown
    cancel: CancellationToken,
}

impl PollWorker {
    pub fn new(
        service: Arc<Service>,
        config: Arc<MonitorConfig>,
        prober: Arc<dyn Prober>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            config,
            prober,
            cancel,
        }
    }

    /// Run until the service's stop flag is observed
    #[instrument(skip(self), fields(service = %self.service))]
    pub async fn run(self) {
        debug!("starting poll worker");

        let mut state = WorkerState::Polling;
        loop {
            state = match state {
                WorkerState::Polling => self.poll().await,
                WorkerState::ConfirmFailure => self.confirm_failure().await,
                WorkerState::Stopped => break,
            };
        }

        debug!("poll worker stopped");
    }

    async fn poll(&self) -> WorkerState {
        if !self.service.is_monitoring() {
            return WorkerState::Stopped;
        }

        // every wait would return at once, so there is nothing left to pace
        if self.cancel.is_cancelled() {
            debug!("monitor shut down, leaving poll loop");
            return WorkerState::Stopped;
        }

        trace!("checking connection");
        match self.probe().await {
            ProbeOutcome::Reachable => {
                trace!("connection successful");
                if self.service.set_status(true) {
                    info!("service is reachable again");
                }
                self.wait(self.service.polling_interval(), "polling interval")
                    .await;
                WorkerState::Polling
            }
            ProbeOutcome::Refused => {
                warn!("connection refused, confirming after grace period");
                WorkerState::ConfirmFailure
            }
            ProbeOutcome::Transient(reason) => {
                warn!("probe failed: {reason}");
                self.wait(self.service.polling_interval(), "polling interval")
                    .await;
                WorkerState::Polling
            }
        }
    }

    async fn confirm_failure(&self) -> WorkerState {
        let grace = self.config.grace_period();
        debug!("waiting {}ms before recheck", grace.as_millis());

        if !self.wait(grace, "grace period").await {
            return WorkerState::Polling;
        }

        match self.probe().await {
            ProbeOutcome::Reachable => {
                info!("service answered within grace period");
            }
            ProbeOutcome::Refused => {
                warn!("connection still refused after grace period");
                if self.service.set_status(false) {
                    warn!("service confirmed down");
                } else {
                    debug!("service already marked down");
                }
            }
            ProbeOutcome::Transient(reason) => {
                warn!("recheck failed: {reason}");
            }
        }

        WorkerState::Polling
    }

    async fn probe(&self) -> ProbeOutcome {
        self.prober
            .probe(self.service.host(), self.service.port())
            .await
    }

    /// Sleep for `duration`; returns `false` if the wait was interrupted
    async fn wait(&self, duration: Duration, what: &str) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancel.cancelled() => {
                warn!("{what} wait interrupted");
                false
            }
        }
    }
}

/// Handle to a spawned [`PollWorker`]
#[derive(Debug)]
pub struct WorkerHandle {
    key: ServiceKey,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Spawn a worker for `service` on the current runtime
    pub fn spawn(
        service: Arc<Service>,
        config: Arc<MonitorConfig>,
        prober: Arc<dyn Prober>,
        cancel: CancellationToken,
    ) -> Self {
        let key = service.key().clone();
        let worker = PollWorker::new(service, config, prober, cancel);

        Self {
            key,
            join: tokio::spawn(worker.run()),
        }
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker to exit; a panicked worker is logged, not propagated
    pub async fn join(self) {
        if let Err(e) = self.join.await {
            error!("poll worker for {} failed: {e}", self.key);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
