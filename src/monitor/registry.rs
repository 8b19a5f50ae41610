//! Shared monitor state: the service registry and the grace period

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::{Service, ServiceKey};
use crate::util::get_default_grace_period;
use crate::validation::Validator;

/// State shared between the facade and every poll worker
///
/// Constructed once and handed around as `Arc<MonitorConfig>`. Compound
/// registry operations happen inside a single critical section. The grace
/// period has one writer at a time; workers read it without locking.
#[derive(Debug)]
pub struct MonitorConfig {
    services: RwLock<HashMap<ServiceKey, Arc<Service>>>,
    grace_period_ms: AtomicU64,
    grace_writer: Mutex<()>,
}

impl MonitorConfig {
    pub fn new(grace_period_ms: u64) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            grace_period_ms: AtomicU64::new(grace_period_ms),
            grace_writer: Mutex::new(()),
        }
    }

    /// Registry pre-populated with `services`; later duplicates are dropped
    pub fn with_services(
        grace_period_ms: u64,
        services: impl IntoIterator<Item = Arc<Service>>,
    ) -> Self {
        let config = Self::new(grace_period_ms);
        for service in services {
            if !config.insert_if_absent(service.clone()) {
                warn!("ignoring duplicate service {service} in initial set");
            }
        }
        config
    }

    /// Registry built from the bootstrap file, held to the same rules as the facade
    ///
    /// An out-of-range grace period falls back to the default. Services that
    /// fail validation are logged and left out.
    pub async fn from_config(config: &Config, validator: &dyn Validator) -> Self {
        let grace_period_ms = match config.grace_period() {
            grace if validator.validate_grace_period(grace) => grace,
            grace => {
                let fallback = get_default_grace_period();
                warn!("grace period of {grace}ms is not valid, using {fallback}ms");
                fallback
            }
        };

        let mut services = Vec::new();
        for service in config.build_services() {
            match validator.validate_service(&service).await {
                Ok(()) => services.push(service),
                Err(e) => warn!("skipping service {service}: {e}"),
            }
        }

        Self::with_services(grace_period_ms, services)
    }

    pub fn grace_period_ms(&self) -> u64 {
        self.grace_period_ms.load(Ordering::SeqCst)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms())
    }

    /// Unchecked setter; range checks belong to the caller
    pub fn set_grace_period(&self, grace_period_ms: u64) {
        let _guard = self.grace_writer.lock();
        self.grace_period_ms.store(grace_period_ms, Ordering::SeqCst);
        debug!("grace period set to {grace_period_ms}ms");
    }

    /// Insert unless a service with the same key exists; returns whether it was inserted
    pub fn insert_if_absent(&self, service: Arc<Service>) -> bool {
        match self.services.write().entry(service.key().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(service);
                true
            }
        }
    }

    pub fn get(&self, key: &ServiceKey) -> Option<Arc<Service>> {
        self.services.read().get(key).cloned()
    }

    /// Snapshot of all registered services
    pub fn services(&self) -> Vec<Arc<Service>> {
        self.services.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(get_default_grace_period())
    }
}
