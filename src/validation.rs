//! Input validation for the monitor facade
//!
//! Validation collects every violated rule into one multi-line message
//! instead of stopping at the first problem.

use std::fmt::Write;

use async_trait::async_trait;
use tracing::trace;

use crate::error::{MonitorError, Result};
use crate::model::{Client, Service};
use crate::util::{MAX_GRACE_PERIOD_MS, MIN_GRACE_PERIOD_MS, MIN_POLLING_INTERVAL_MS};

/// Gate the facade runs before touching the registry
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate a service and all of its pre-registered clients
    async fn validate_service(&self, service: &Service) -> Result<()>;

    /// Validate the basics of a service plus one client to attach to it
    async fn validate_registration(&self, service: &Service, client: &Client) -> Result<()>;

    fn validate_grace_period(&self, grace_period_ms: u64) -> bool;
}

/// Default validator: host must resolve, intervals and windows must be sane
#[derive(Debug, Clone, Copy, Default)]
pub struct InputValidator;

impl InputValidator {
    async fn check_service(&self, service: &Service, message: &mut String) {
        let host = service.host();

        if host.trim().is_empty() {
            let _ = writeln!(message, "service host value is not valid: {host:?}");
            return;
        }

        if let Err(e) = tokio::net::lookup_host((host, service.port())).await {
            trace!("failed to resolve {host}: {e}");
            let _ = writeln!(message, "service host value is not valid: {host} ({e})");
        }
    }

    fn check_client(&self, client: &Client, message: &mut String) {
        let interval = client.polling_interval_ms();
        if interval < MIN_POLLING_INTERVAL_MS {
            let _ = writeln!(
                message,
                "client polling interval value is not valid: {interval}ms (minimum {MIN_POLLING_INTERVAL_MS}ms)"
            );
        }

        match client.outage_window() {
            None => {
                let _ = writeln!(message, "client service outage window value is not valid: none");
            }
            Some(window) if !window.is_well_formed() => {
                let _ = writeln!(
                    message,
                    "client outage window value is not valid: start {} is after end {}",
                    window.start, window.end
                );
            }
            Some(_) => {}
        }
    }
}

fn into_result(message: String) -> Result<()> {
    if message.is_empty() {
        Ok(())
    } else {
        Err(MonitorError::Validation(message))
    }
}

#[async_trait]
impl Validator for InputValidator {
    async fn validate_service(&self, service: &Service) -> Result<()> {
        let mut message = String::new();

        self.check_service(service, &mut message).await;
        for client in service.clients_snapshot() {
            self.check_client(&client, &mut message);
        }

        into_result(message)
    }

    async fn validate_registration(&self, service: &Service, client: &Client) -> Result<()> {
        let mut message = String::new();

        self.check_service(service, &mut message).await;
        self.check_client(client, &mut message);

        into_result(message)
    }

    fn validate_grace_period(&self, grace_period_ms: u64) -> bool {
        (MIN_GRACE_PERIOD_MS..MAX_GRACE_PERIOD_MS).contains(&grace_period_ms)
    }
}
