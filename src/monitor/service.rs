//! MonitorService - the caller-facing facade
//!
//! Owns the worker handles and routes every registry mutation through
//! validation first. Errors from these calls go to the caller; anything that
//! goes wrong inside a worker stays there.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{MonitorError, Result};
use crate::model::{Client, ClientId, Service};
use crate::probe::{Prober, TcpProber};
use crate::validation::{InputValidator, Validator};

use super::registry::MonitorConfig;
use super::worker::WorkerHandle;

pub struct MonitorService {
    config: Arc<MonitorConfig>,
    validator: Arc<dyn Validator>,
    prober: Arc<dyn Prober>,

    /// Shared by every worker; cancelled on shutdown
    cancel: CancellationToken,

    workers: Mutex<Vec<WorkerHandle>>,
}

impl MonitorService {
    /// Facade with the default validator and TCP prober
    pub fn new(config: Arc<MonitorConfig>) -> Self {
        Self::with_components(
            config,
            Arc::new(InputValidator),
            Arc::new(TcpProber::default()),
        )
    }

    pub fn with_components(
        config: Arc<MonitorConfig>,
        validator: Arc<dyn Validator>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            config,
            validator,
            prober,
            cancel: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &Arc<MonitorConfig> {
        &self.config
    }

    /// Spawn one worker per registered service; returns how many were spawned
    ///
    /// Calling this twice polls every service twice.
    pub fn start_service_monitor(&self) -> usize {
        if self.cancel.is_cancelled() {
            warn!("monitor has been shut down, not starting any workers");
            return 0;
        }

        let services = self.config.services();
        let count = services.len();

        for service in services {
            self.spawn_worker(service);
        }

        count
    }

    /// Validate, register and immediately start polling a new service
    ///
    /// Fails with `ShutDown` once [`Self::shutdown`] has been called.
    #[instrument(skip_all, fields(service = %service))]
    pub async fn add_and_monitor_new_service(&self, service: Arc<Service>) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(MonitorError::ShutDown);
        }

        self.validator.validate_service(&service).await?;

        if !self.config.insert_if_absent(service.clone()) {
            return Err(MonitorError::AlreadyMonitored(service.key().clone()));
        }

        self.spawn_worker(service);
        Ok(())
    }

    /// Attach `client` to the registered service matching `service`
    ///
    /// Unknown services are ignored; use [`Self::try_register_interest`] to
    /// get an error instead.
    pub async fn register_interest_in_existing_service(
        &self,
        service: &Service,
        client: Client,
    ) -> Result<()> {
        match self.try_register_interest(service, client).await {
            Err(MonitorError::NotFound(key)) => {
                warn!("no monitored service matches {key}, ignoring registration");
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    /// Like [`Self::register_interest_in_existing_service`], but fails with
    /// `NotFound` for unknown services and returns the assigned client id
    #[instrument(skip_all, fields(service = %service))]
    pub async fn try_register_interest(&self, service: &Service, client: Client) -> Result<ClientId> {
        self.validator.validate_registration(service, &client).await?;

        let stored = self
            .config
            .get(service.key())
            .ok_or_else(|| MonitorError::NotFound(service.key().clone()))?;

        let id = stored.register_client(client);
        info!(
            "client {id} registered, polling every {}ms",
            stored.polling_interval_ms()
        );
        Ok(id)
    }

    /// Set the shared grace period; invalid values are ignored
    pub fn update_grace_period(&self, grace_period_ms: u64) {
        if let Err(e) = self.try_update_grace_period(grace_period_ms) {
            warn!("ignoring grace period update: {e}");
        }
    }

    pub fn try_update_grace_period(&self, grace_period_ms: u64) -> Result<()> {
        if !self.validator.validate_grace_period(grace_period_ms) {
            return Err(MonitorError::InvalidGracePeriod(grace_period_ms));
        }

        self.config.set_grace_period(grace_period_ms);
        info!("grace period updated to {grace_period_ms}ms");
        Ok(())
    }

    /// Signal every worker to stop at its next loop iteration
    ///
    /// Does not wait for the workers to exit.
    pub fn stop_service_monitoring(&self) {
        info!("stopping service monitor");

        for service in self.config.services() {
            service.stop();
        }

        info!("service monitor stopped");
    }

    /// Stop all workers, interrupt their waits and wait for them to exit
    pub async fn shutdown(&self) {
        self.stop_service_monitoring();
        self.cancel.cancel();

        let workers = std::mem::take(&mut *self.workers.lock());
        debug!("joining {} poll worker(s)", workers.len());

        futures::future::join_all(workers.into_iter().map(WorkerHandle::join)).await;
    }

    /// Number of spawned workers that have not exited yet
    pub fn active_workers(&self) -> usize {
        self.workers
            .lock()
            .iter()
            .filter(|worker| !worker.is_finished())
            .count()
    }

    fn spawn_worker(&self, service: Arc<Service>) {
        info!("service {service} set for monitoring");

        let handle = WorkerHandle::spawn(
            service,
            self.config.clone(),
            self.prober.clone(),
            self.cancel.clone(),
        );

        let mut workers = self.workers.lock();
        workers.retain(|worker| !worker.is_finished());
        workers.push(handle);
    }
}
