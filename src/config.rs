use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use crate::error::{MonitorError, Result};
use crate::model::{Client, OutageWindow, Service};

/// Bootstrap configuration: the initial service set and grace period
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Grace period in milliseconds (falls back to the environment, then the default)
    pub grace_period_ms: Option<u64>,

    pub services: Option<Vec<ServiceConfig>>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ClientConfig {
    #[serde(default = "crate::util::get_default_polling_interval")]
    pub polling_interval_ms: u64,
    pub outage_window: Option<OutageWindow>,
}

impl Config {
    /// Grace period as declared (file, then environment, then default), not yet range-checked
    pub fn grace_period(&self) -> u64 {
        self.grace_period_ms
            .unwrap_or_else(crate::util::get_grace_period)
    }

    /// Build services with their clients pre-registered, in file order
    pub fn build_services(&self) -> Vec<Arc<Service>> {
        let Some(services) = &self.services else {
            return vec![];
        };

        services.iter().map(ServiceConfig::build).collect()
    }
}

impl ServiceConfig {
    pub fn build(&self) -> Arc<Service> {
        let service = Service::new(self.host.as_str(), self.port);
        for client in &self.clients {
            service.register_client(client.build());
        }
        service
    }
}

impl ClientConfig {
    pub fn build(&self) -> Client {
        match self.outage_window {
            Some(window) => Client::new(self.polling_interval_ms, window),
            None => Client::without_outage_window(self.polling_interval_ms),
        }
    }
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&file_content)?;

    if config.services.as_ref().is_none_or(Vec::is_empty) {
        return Err(MonitorError::Config(format!(
            "{} does not declare any services",
            path.display()
        )));
    }

    trace!("loaded config: {config:?}");
    Ok(config)
}
